//! Ingestion pipeline: read regulation markdown, chunk, embed, load the index.

use std::path::Path;

use anyhow::Context;
use kfund_ai::Embedder;
use kfund_core::{Chunker, Document};
use kfund_store::{ChunkRecord, VectorIndex};
use tracing::{info, warn};

const EMBED_BATCH_SIZE: usize = 256;
const REGULATION_CATEGORY: &str = "K_FUND";

#[derive(Debug)]
pub struct IngestStats {
    pub files: usize,
    pub chunks: usize,
}

/// Run the full ingestion pipeline: read `*.md` → chunk → embed → rebuild
/// the collection.
///
/// Only files whose stem carries a `K-Fund` or `K_Fund` marker are loaded;
/// everything else in the directory is skipped. The collection is replaced
/// wholesale, so re-running after editing a regulation file never leaves
/// stale chunks behind.
pub async fn run(
    dir: &Path,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    chunk_size: usize,
    overlap: usize,
) -> anyhow::Result<IngestStats> {
    let documents = load_regulation_files(dir)?;
    if documents.is_empty() {
        anyhow::bail!("no K Fund regulation files found in {}", dir.display());
    }
    let files = documents.len();

    let mut chunker = Chunker::new(chunk_size, overlap);
    let chunks: Vec<_> = documents.iter().flat_map(|doc| chunker.split(doc)).collect();
    info!(files, chunks = chunks.len(), "chunked regulation files");

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(EMBED_BATCH_SIZE) {
        let vectors = embedder
            .embed_many(batch)
            .await
            .context("generating embeddings")?;
        embeddings.extend(vectors);
    }

    let records: Vec<ChunkRecord> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| ChunkRecord::from_chunk(chunk, embedding))
        .collect();
    let total = records.len();

    index
        .recreate(&records)
        .await
        .context("rebuilding the regulation collection")?;

    Ok(IngestStats {
        files,
        chunks: total,
    })
}

/// Load K Fund regulation markdown files from a directory, sorted by name.
///
/// Unreadable files are skipped with a warning rather than aborting the
/// run; a partially rebuilt index from a clean subset beats no index.
fn load_regulation_files(dir: &Path) -> anyhow::Result<Vec<Document>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        if !stem.contains("K-Fund") && !stem.contains("K_Fund") {
            info!(file = %stem, "skipping non-K-Fund file");
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(text) => documents.push(Document {
                source: stem,
                category: REGULATION_CATEGORY.into(),
                text,
            }),
            Err(err) => warn!(file = %path.display(), error = %err, "skipping unreadable file"),
        }
    }

    Ok(documents)
}
