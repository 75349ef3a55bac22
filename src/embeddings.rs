use crate::error::{MemoryError, Result};
use md5::{Digest, Md5};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Dimension of the vectors stored in the index
pub const STORE_DIM: usize = 128;

/// Vocabulary size of the term-frequency embedder used by semantic search
pub const SEARCH_VOCAB_SIZE: usize = 1000;

/// Trait for embedding implementations
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of the vectors this embedder produces, if known up front
    fn dimension(&self) -> Option<usize>;

    fn name(&self) -> String;
}

// =============================================================================
// SeededEmbedder - hash-seeded random vectors
// =============================================================================

/// Placeholder embedder: a PRNG seeded with the sum of the text's code points.
///
/// Same text, same vector. The seed is a weak hash, so texts with the same
/// characters in a different order (anagrams) collide. Not semantic at all;
/// it only gives the index something stable to store until a real model is
/// wired in through [`ServerEmbedder`].
pub struct SeededEmbedder {
    dim: usize,
}

impl SeededEmbedder {
    pub fn with_dim(dim: usize) -> Self {
        Self { dim }
    }
}

impl Embedder for SeededEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let seed: u64 = text.chars().map(|c| c as u64).sum();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut vector: Vec<f32> = (0..self.dim)
            .map(|_| rng.random_range(-1.0f32..=1.0))
            .collect();
        normalize(&mut vector);

        Ok(vector)
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dim)
    }

    fn name(&self) -> String {
        format!("seeded ({} dims)", self.dim)
    }
}

// =============================================================================
// TermFrequencyEmbedder - hashed bag of words
// =============================================================================

/// Bag-of-words embedder: term frequencies hashed into a fixed vocabulary.
///
/// When two tokens hash to the same slot the later one overwrites the
/// earlier one; slots are assigned, never summed.
pub struct TermFrequencyEmbedder {
    vocab_size: usize,
}

impl TermFrequencyEmbedder {
    pub fn new() -> Self {
        Self::with_vocab_size(SEARCH_VOCAB_SIZE)
    }

    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self { vocab_size }
    }

    /// Embed without the `Result` wrapper; this embedder cannot fail
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = token_regex()
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .collect();

        if tokens.is_empty() || self.vocab_size == 0 {
            return Vec::new();
        }

        // Distinct tokens in first-occurrence order
        let mut order: Vec<&str> = Vec::new();
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for token in tokens {
            let count = freq.entry(token).or_insert(0);
            if *count == 0 {
                order.push(token);
            }
            *count += 1;
        }

        let mut vector = vec![0.0f32; self.vocab_size];
        for token in order {
            let idx = (md5_hash(token) % self.vocab_size as u128) as usize;
            vector[idx] = freq[token] as f32;
        }

        normalize(&mut vector);
        vector
    }
}

impl Embedder for TermFrequencyEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.vocab_size)
    }

    fn name(&self) -> String {
        format!("term-frequency ({} slots)", self.vocab_size)
    }
}

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(r"\w+").expect("static token pattern"))
}

/// Compute MD5 hash and return as u128
fn md5_hash(text: &str) -> u128 {
    let mut hasher = Md5::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    u128::from_be_bytes(result.into())
}

/// MD5 hex digest, used as the document id of indexed entries
pub fn content_id(text: &str) -> String {
    format!("{:032x}", md5_hash(text))
}

/// Scale to unit length; zero vectors are left alone
fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

// =============================================================================
// ServerEmbedder - Unix socket client for an external embedding daemon
// =============================================================================

/// Default socket path for the embedding daemon
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/vault-memory-embedder.sock";

const READ_TIMEOUT: Duration = Duration::from_secs(60);
const RETRY_DELAY: Duration = Duration::from_millis(200);
const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    cmd: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct PingRequest<'a> {
    cmd: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    ok: bool,
    embedding: Option<Vec<f32>>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct PingResponse {
    ok: bool,
    model: Option<String>,
    error: Option<String>,
}

/// Embedder that delegates to an embedding daemon over a Unix socket
pub struct ServerEmbedder {
    socket_path: PathBuf,
    model: String,
}

impl ServerEmbedder {
    /// Connect to the daemon, failing if it does not answer a ping
    pub fn connect(socket_path: impl Into<PathBuf>) -> Result<Self> {
        let socket_path = socket_path.into();
        if !socket_path.exists() {
            return Err(MemoryError::Embedding(format!(
                "no embedding server socket at {}",
                socket_path.display()
            )));
        }

        let model = Self::ping(&socket_path)?;
        Ok(Self { socket_path, model })
    }

    /// Ping the server and get the model name
    pub fn ping(socket_path: &Path) -> Result<String> {
        let request = PingRequest { cmd: "ping" };
        let response: PingResponse = send_request(socket_path, &request)?;

        if response.ok {
            Ok(response.model.unwrap_or_default())
        } else {
            Err(MemoryError::Embedding(
                response.error.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Embedder for ServerEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest { cmd: "embed", text };
        let response: EmbedResponse = send_request(&self.socket_path, &request)?;

        if response.ok {
            response
                .embedding
                .ok_or_else(|| MemoryError::Embedding("No embedding in response".to_string()))
        } else {
            Err(MemoryError::Embedding(
                response.error.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }

    /// Depends on the daemon's model, only known after an embed call
    fn dimension(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> String {
        format!("server ({})", self.model)
    }
}

/// Send a request, retrying once if the socket round-trip fails
fn send_request<R, T>(socket_path: &Path, request: &R) -> Result<T>
where
    R: Serialize,
    T: for<'de> Deserialize<'de>,
{
    let payload = serde_json::to_vec(request)?;

    let buffer = match round_trip(socket_path, &payload) {
        Ok(buffer) => buffer,
        Err(e) => {
            debug!("embedding server round-trip failed ({}), retrying once", e);
            std::thread::sleep(RETRY_DELAY);
            round_trip(socket_path, &payload).map_err(|e| {
                MemoryError::Embedding(format!("embedding server unreachable: {}", e))
            })?
        }
    };

    serde_json::from_slice(&buffer)
        .map_err(|e| MemoryError::Embedding(format!("Failed to parse response: {}", e)))
}

fn round_trip(socket_path: &Path, payload: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut stream = UnixStream::connect(socket_path)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    stream.write_all(payload)?;
    // Half-close marks the end of the request
    stream.shutdown(std::net::Shutdown::Write)?;

    let mut buffer = Vec::new();
    stream.take(MAX_RESPONSE_BYTES).read_to_end(&mut buffer)?;

    // A server that hangs up without answering counts as a failed attempt
    if buffer.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed without a response",
        ));
    }
    Ok(buffer)
}

// =============================================================================
// Cosine similarity
// =============================================================================

/// Compute cosine similarity between two vectors.
///
/// Empty inputs and zero-magnitude vectors score 0.0. The dot product only
/// pairs elements up to the shorter length while each norm covers its whole
/// vector, so vectors of different dimensions produce a meaningless number
/// rather than an error. Callers must not compare store vectors with
/// search vectors.
pub fn cosine_similarity(vec_a: &[f32], vec_b: &[f32]) -> f64 {
    if vec_a.is_empty() || vec_b.is_empty() {
        return 0.0;
    }

    let dot: f64 = vec_a
        .iter()
        .zip(vec_b.iter())
        .map(|(a, b)| *a as f64 * *b as f64)
        .sum();
    let norm_a: f64 = vec_a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = vec_b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

// =============================================================================
// Embedder factory
// =============================================================================

/// Which embedder a vault is configured to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    Seeded,
    Server,
}

impl EmbedderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "seeded" => Some(EmbedderKind::Seeded),
            "server" => Some(EmbedderKind::Server),
            _ => None,
        }
    }
}

/// Build the configured embedder, probing the server before using it
pub fn get_embedder(kind: EmbedderKind, dim: usize, socket_path: &Path) -> Box<dyn Embedder> {
    if kind == EmbedderKind::Server {
        match ServerEmbedder::connect(socket_path) {
            Ok(server) => {
                info!("using embedding server model {}", server.model());
                return Box::new(server);
            }
            Err(e) => {
                warn!(
                    "Embedding server not available ({}). Using seeded embedder.",
                    e
                );
            }
        }
    }

    Box::new(SeededEmbedder::with_dim(dim))
}
