//! Node-by-node reading of large XML documents
//!
//! The project list of the release history service is too large to buffer.
//! Bytes are fed to a [`NodeSplitter`] as they arrive and complete
//! `<project>…</project>` fragments come out one at a time; only the
//! unfinished tail of the document is ever held in memory.

use crate::error::RegistryError;
use futures::stream::{self, Stream, StreamExt};
use reqwest::Response;

/// Splits a byte stream into complete element fragments
#[derive(Debug)]
pub struct NodeSplitter {
    buffer: Vec<u8>,
    open: Vec<u8>,
    close: Vec<u8>,
}

impl NodeSplitter {
    /// Create a splitter for elements with the given local name
    pub fn new(element: &str) -> Self {
        Self {
            buffer: Vec::new(),
            open: format!("<{}", element).into_bytes(),
            close: format!("</{}>", element).into_bytes(),
        }
    }

    /// Append the next chunk of the document
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete fragment, if the buffer holds one
    pub fn next_node(&mut self) -> Option<String> {
        let mut from = 0;
        loop {
            let Some(offset) = find(&self.buffer[from..], &self.open) else {
                // Keep a possible partial opening tag at the end
                let keep = self.open.len().saturating_sub(1);
                let cut = self.buffer.len().saturating_sub(keep);
                self.buffer.drain(..cut);
                return None;
            };
            let start = from + offset;
            let after = start + self.open.len();

            match self.buffer.get(after) {
                None => {
                    self.buffer.drain(..start);
                    return None;
                }
                Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {}
                // `<projects>` and friends
                Some(_) => {
                    from = after;
                    continue;
                }
            }

            let Some(close_offset) = find(&self.buffer[after..], &self.close) else {
                self.buffer.drain(..start);
                return None;
            };
            let end = after + close_offset + self.close.len();
            let node = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
            self.buffer.drain(..end);
            return Some(node);
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Lazily split a chunk stream into element fragments
///
/// The sequence is finite and single-pass; it ends after the first error.
pub fn split_nodes<S>(chunks: S, element: &str) -> impl Stream<Item = Result<String, RegistryError>>
where
    S: Stream<Item = Result<Vec<u8>, RegistryError>> + Unpin,
{
    let splitter = NodeSplitter::new(element);
    stream::unfold(Some((chunks, splitter)), |state| async move {
        let (mut chunks, mut splitter) = state?;
        loop {
            if let Some(node) = splitter.next_node() {
                return Some((Ok(node), Some((chunks, splitter))));
            }
            match chunks.next().await {
                Some(Ok(chunk)) => splitter.push(&chunk),
                Some(Err(e)) => return Some((Err(e), None)),
                None => return None,
            }
        }
    })
}

/// Read a response body chunk by chunk
pub fn response_chunks(
    response: Response,
    resource: String,
    source_name: &'static str,
) -> impl Stream<Item = Result<Vec<u8>, RegistryError>> {
    stream::unfold(Some(response), move |state| {
        let resource = resource.clone();
        async move {
            let mut response = state?;
            match response.chunk().await {
                Ok(Some(bytes)) => Some((Ok(bytes.to_vec()), Some(response))),
                Ok(None) => None,
                Err(e) => Some((
                    Err(RegistryError::network(resource, source_name, e.to_string())),
                    None,
                )),
            }
        }
    })
}
