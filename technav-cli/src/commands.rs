//! Subcommand handlers. Each one calls a single service operation and
//! renders the result.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, bail};
use serde::Serialize;
use technav_rag::{
    Document, DocumentMetadata, DocumentQuery, DocumentsSummary, NewDocument, OwnerScope,
    RagAnswer, SearchOptions, SearchResult,
};

use crate::app::App;
use crate::cli::{Command, OutputFormat};

/// Characters of content shown per search hit in plain output.
const PREVIEW_CHARS: usize = 160;

/// Run `command` under `scope`, writing the result to `out`.
pub async fn run<W: Write>(
    app: &App,
    scope: &OwnerScope,
    command: Command,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::Ingest { paths, title, source, doc_type } => {
            let Some(owner) = scope.owner_id() else {
                bail!("ingest stores documents for one user: pass --user instead of --all-users");
            };
            let mut documents = Vec::with_capacity(paths.len());
            for path in &paths {
                let document =
                    read_document(path, title.as_deref(), &source, doc_type.as_deref()).await?;
                documents.push(document);
            }
            let ids = app.vector_store.store_many(owner, documents).await?;
            match format {
                OutputFormat::Json => write_json(out, &ids)?,
                OutputFormat::Plain => {
                    for (path, id) in paths.iter().zip(&ids) {
                        writeln!(out, "{id}  {}", path.display())?;
                    }
                }
            }
        }
        Command::Search { query, limit, threshold, no_metadata, filter } => {
            let mut options =
                SearchOptions::default().filter(filter.to_filter()).include_metadata(!no_metadata);
            if let Some(limit) = limit {
                options = options.limit(limit);
            }
            if let Some(threshold) = threshold {
                options = options.threshold(threshold);
            }
            let results = app.vector_store.advanced_search(scope, &query, &options).await?;
            match format {
                OutputFormat::Json => write_json(out, &results)?,
                OutputFormat::Plain => write_results(out, &results)?,
            }
        }
        Command::Ask { question, limit, filter } => {
            let mut query = DocumentQuery::new(question).with_filter(filter.to_filter());
            if let Some(limit) = limit {
                query = query.with_limit(limit);
            }
            let answer = app.rag.query_documents(scope, query).await?;
            match format {
                OutputFormat::Json => write_json(out, &answer)?,
                OutputFormat::Plain => write_answer(out, &answer)?,
            }
        }
        Command::List { limit } => {
            let documents = app.vector_store.get_all_documents(scope, limit).await?;
            match format {
                OutputFormat::Json => write_json(out, &documents)?,
                OutputFormat::Plain => write_documents(out, &documents)?,
            }
        }
        Command::Summary => {
            let summary = app.rag.get_documents_summary(scope).await?;
            match format {
                OutputFormat::Json => write_json(out, &summary)?,
                OutputFormat::Plain => write_summary(out, &summary)?,
            }
        }
        Command::Delete { filter } => {
            let removed = app.vector_store.delete_documents(scope, &filter.to_filter()).await?;
            match format {
                OutputFormat::Json => write_json(out, &serde_json::json!({ "deleted": removed }))?,
                OutputFormat::Plain => writeln!(out, "Deleted {removed} documents")?,
            }
        }
    }
    Ok(())
}

async fn read_document(
    path: &Path,
    title: Option<&str>,
    source: &str,
    doc_type: Option<&str>,
) -> anyhow::Result<NewDocument> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let mut metadata =
        DocumentMetadata::new().with_source(source).with_file_size(content.len() as u64);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        metadata = metadata.with_file_name(name);
    }
    if let Some(title) = title.or_else(|| path.file_stem().and_then(|s| s.to_str())) {
        metadata = metadata.with_title(title);
    }
    if let Some(doc_type) = doc_type.or_else(|| path.extension().and_then(|e| e.to_str())) {
        metadata = metadata.with_type(doc_type);
    }
    Ok(NewDocument::new(content).with_metadata(metadata))
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn label(metadata: &DocumentMetadata) -> &str {
    metadata.display_name().unwrap_or("(untitled)")
}

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &flat[..end]),
        None => flat,
    }
}

fn write_results<W: Write>(out: &mut W, results: &[SearchResult]) -> anyhow::Result<()> {
    if results.is_empty() {
        writeln!(out, "No matching documents.")?;
    }
    for (i, result) in results.iter().enumerate() {
        writeln!(
            out,
            "{}. [{:.3}] {} ({})",
            i + 1,
            result.similarity,
            label(&result.metadata),
            result.id
        )?;
        writeln!(out, "   {}", preview(&result.content))?;
    }
    Ok(())
}

fn write_answer<W: Write>(out: &mut W, answer: &RagAnswer) -> anyhow::Result<()> {
    writeln!(out, "{}", answer.answer)?;
    if !answer.sources.is_empty() {
        writeln!(out)?;
        writeln!(out, "Sources:")?;
        for source in &answer.sources {
            writeln!(out, "- {} ({:.1}%)", label(&source.metadata), source.similarity * 100.0)?;
        }
    }
    Ok(())
}

fn write_documents<W: Write>(out: &mut W, documents: &[Document]) -> anyhow::Result<()> {
    for document in documents {
        let uploaded = document
            .metadata
            .upload_date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{}  {}  {}  {}",
            document.id,
            uploaded,
            document.metadata.doc_type.as_deref().unwrap_or("-"),
            label(&document.metadata)
        )?;
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, summary: &DocumentsSummary) -> anyhow::Result<()> {
    writeln!(out, "Documents: {}", summary.total_documents)?;
    for (doc_type, count) in &summary.document_types {
        writeln!(out, "  {doc_type}: {count}")?;
    }
    if !summary.recent_uploads.is_empty() {
        writeln!(out, "Recent uploads:")?;
        for upload in &summary.recent_uploads {
            let when = upload
                .upload_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "undated".to_string());
            writeln!(out, "  {when}  {}", upload.title.as_deref().unwrap_or("(untitled)"))?;
        }
    }
    Ok(())
}
