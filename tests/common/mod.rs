#![allow(dead_code)]

//! In-memory index fakes shared by the integration tests.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use lexiq::lexical::{
    BooleanQuery, IndexReader, Occur, Query, ScoreDoc, SearchRequest, Searcher, TopDocs,
    WildcardQuery,
};
use lexiq::{LexiqError, Result, SnapshotPrimitives};

/// What a searcher was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub query: String,
    pub filter: Option<String>,
    pub limit: usize,
}

#[derive(Debug)]
pub struct FakeReader {
    id: u64,
    version: u64,
    hits: Vec<ScoreDoc>,
    titles: Vec<String>,
}

impl FakeReader {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl IndexReader for FakeReader {
    fn version(&self) -> u64 {
        self.version
    }

    fn num_docs(&self) -> u64 {
        self.hits.len() as u64
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct FakeSearcher {
    reader: Arc<dyn IndexReader>,
    hits: Vec<ScoreDoc>,
    titles: Vec<String>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeSearcher {
    pub fn reader_id(&self) -> u64 {
        self.reader
            .as_any()
            .downcast_ref::<FakeReader>()
            .map_or(0, FakeReader::id)
    }
}

impl Searcher for FakeSearcher {
    fn reader(&self) -> &Arc<dyn IndexReader> {
        &self.reader
    }

    fn search(&self, request: &SearchRequest) -> Result<TopDocs> {
        self.requests.lock().push(RecordedRequest {
            query: request.query.description(),
            filter: request.filter.as_ref().map(|f| f.description()),
            limit: request.limit,
        });
        let patterns = title_patterns(request.query.as_ref());
        let matching: Vec<ScoreDoc> = self
            .hits
            .iter()
            .filter(|hit| {
                patterns.is_empty()
                    || self
                        .titles
                        .get(hit.doc_id as usize)
                        .is_some_and(|title| patterns.iter().all(|p| p.matches(title)))
            })
            .copied()
            .collect();
        let total_hits = matching.len() as u64;
        let hits = matching.into_iter().take(request.limit).collect();
        Ok(TopDocs::new(total_hits, hits))
    }
}

/// Required wildcard clauses on `title`; only these filter documents.
fn title_patterns(query: &dyn Query) -> Vec<&WildcardQuery> {
    let Some(boolean) = query.as_any().downcast_ref::<BooleanQuery>() else {
        return Vec::new();
    };
    boolean
        .clauses()
        .iter()
        .filter(|clause| matches!(clause.occur, Occur::Must | Occur::Filter))
        .filter_map(|clause| clause.query.as_any().downcast_ref::<WildcardQuery>())
        .filter(|wildcard| wildcard.field() == Some("title"))
        .collect()
}

#[derive(Debug, Default)]
struct IndexState {
    version: u64,
    hits: Vec<ScoreDoc>,
    opened: Vec<u64>,
    closed: Vec<u64>,
    titles: Vec<String>,
    reopens: usize,
    fail_reopen: bool,
    fail_searcher: bool,
}

/// A versioned index whose "writes" are simulated with [`FakeIndex::bump`].
#[derive(Debug, Default)]
pub struct FakeIndex {
    state: Mutex<IndexState>,
    next_reader: AtomicU64,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// An index whose hits are documents `0..n` scored `n..1`.
    pub fn with_docs(n: u64) -> Arc<Self> {
        let index = Self::new();
        index.set_hits(descending_hits(n));
        index
    }

    pub fn primitives(self: &Arc<Self>) -> Arc<dyn SnapshotPrimitives> {
        Arc::clone(self) as Arc<dyn SnapshotPrimitives>
    }

    /// Simulate a committed write.
    pub fn bump(&self) {
        self.state.lock().version += 1;
    }

    /// Replace the hits returned by readers opened from now on.
    pub fn set_hits(&self, hits: Vec<ScoreDoc>) {
        let mut state = self.state.lock();
        state.hits = hits;
        state.version += 1;
    }

    /// Give documents `0..` these titles, for readers opened from now on.
    pub fn set_titles<I, S>(&self, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.lock();
        state.titles = titles.into_iter().map(Into::into).collect();
        state.version += 1;
    }

    pub fn fail_reopen(&self, fail: bool) {
        self.state.lock().fail_reopen = fail;
    }

    /// Make building a searcher over a reopened reader fail.
    pub fn fail_searcher(&self, fail: bool) {
        self.state.lock().fail_searcher = fail;
    }

    pub fn reopens(&self) -> usize {
        self.state.lock().reopens
    }

    /// Reader ids in the order they were opened.
    pub fn opened(&self) -> Vec<u64> {
        self.state.lock().opened.clone()
    }

    /// Reader ids in the order they were closed.
    pub fn closed(&self) -> Vec<u64> {
        self.state.lock().closed.clone()
    }

    pub fn close_count(&self, reader_id: u64) -> usize {
        self.state
            .lock()
            .closed
            .iter()
            .filter(|id| **id == reader_id)
            .count()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    fn new_reader(&self, state: &mut IndexState) -> Arc<dyn IndexReader> {
        let id = self.next_reader.fetch_add(1, Ordering::SeqCst) + 1;
        state.opened.push(id);
        Arc::new(FakeReader {
            id,
            version: state.version,
            hits: state.hits.clone(),
            titles: state.titles.clone(),
        })
    }

    fn new_searcher(&self, reader: &Arc<dyn IndexReader>) -> Result<Arc<dyn Searcher>> {
        let fake = reader
            .as_any()
            .downcast_ref::<FakeReader>()
            .ok_or_else(|| LexiqError::index("foreign reader"))?;
        Ok(Arc::new(FakeSearcher {
            reader: Arc::clone(reader),
            hits: fake.hits.clone(),
            titles: fake.titles.clone(),
            requests: Arc::clone(&self.requests),
        }))
    }
}

impl SnapshotPrimitives for FakeIndex {
    fn open(&self) -> Result<(Arc<dyn IndexReader>, Arc<dyn Searcher>)> {
        let reader = {
            let mut state = self.state.lock();
            self.new_reader(&mut state)
        };
        let searcher = self.new_searcher(&reader)?;
        Ok((reader, searcher))
    }

    fn reopen(&self, reader: &Arc<dyn IndexReader>) -> Result<Arc<dyn IndexReader>> {
        let mut state = self.state.lock();
        state.reopens += 1;
        if state.fail_reopen {
            return Err(LexiqError::index("reopen failed"));
        }
        if reader.version() == state.version {
            return Ok(Arc::clone(reader));
        }
        Ok(self.new_reader(&mut state))
    }

    fn searcher(&self, reader: &Arc<dyn IndexReader>) -> Result<Arc<dyn Searcher>> {
        if self.state.lock().fail_searcher {
            return Err(LexiqError::index("searcher unavailable"));
        }
        self.new_searcher(reader)
    }

    fn close(&self, reader: &Arc<dyn IndexReader>, _searcher: &Arc<dyn Searcher>) -> Result<()> {
        self.close_reader(reader)
    }

    fn close_reader(&self, reader: &Arc<dyn IndexReader>) -> Result<()> {
        let id = reader
            .as_any()
            .downcast_ref::<FakeReader>()
            .map_or(0, FakeReader::id);
        self.state.lock().closed.push(id);
        Ok(())
    }
}

/// Hits for documents `0..n` with strictly descending scores.
pub fn descending_hits(n: u64) -> Vec<ScoreDoc> {
    (0..n).map(|i| ScoreDoc::new(i, (n - i) as f32)).collect()
}

/// The reader id behind a searcher handed out by a [`FakeIndex`].
pub fn reader_id(searcher: &Arc<dyn Searcher>) -> u64 {
    searcher
        .reader()
        .as_any()
        .downcast_ref::<FakeReader>()
        .map_or(0, FakeReader::id)
}
