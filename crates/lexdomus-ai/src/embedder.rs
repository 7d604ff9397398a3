//! ONNX Runtime query encoder for sentence-transformers models.
//!
//! Mean-pooled, L2-normalised embeddings. The default model is the
//! multilingual `paraphrase-multilingual-MiniLM-L12-v2` (384 dimensions), which
//! covers the Spanish and English corpus. The model directory must contain
//! `model.onnx` and `tokenizer.json`.

use std::path::Path;
use std::sync::Mutex;

use lexdomus_core::TextEncoder;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

/// Directory name of the default embedding model under the models root.
pub const DEFAULT_EMBEDDING_MODEL: &str = "paraphrase-multilingual-MiniLM-L12-v2";

pub struct Embedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dim: usize,
    token_types: bool,
}

impl Embedder {
    /// Load an embedding model from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;

        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(384);
        // XLM-R style exports take no token_type_ids input.
        let token_types = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: 256,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

        info!(dim, token_types, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dim,
            token_types,
        })
    }

    /// Embed a batch of texts, returning one normalized vector per input.
    pub fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];
        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("embedding session poisoned"))?;
        let outputs = if self.token_types {
            let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])?
        };

        // Token embeddings: [batch_size, seq_len, dim].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch_size && dims[2] as usize == self.dim,
            "unexpected output shape: {dims:?}, expected [{batch_size}, {seq_len}, {}]",
            self.dim
        );
        let actual_seq_len = dims[1] as usize;

        let mut embeddings = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mut pooled = vec![0.0f32; self.dim];
            let mut token_count = 0.0f32;
            for j in 0..actual_seq_len {
                let mask_val = attention_mask[i * seq_len + j] as f32;
                if mask_val > 0.0 {
                    let offset = (i * actual_seq_len + j) * self.dim;
                    for (d, p) in pooled.iter_mut().enumerate() {
                        *p += output_data[offset + d] * mask_val;
                    }
                    token_count += mask_val;
                }
            }
            if token_count > 0.0 {
                for p in &mut pooled {
                    *p /= token_count;
                }
            }
            normalize(&mut pooled);
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }
}

impl TextEncoder for Embedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("model returned no embedding"))
    }
}

fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Last dimension of the first output tensor.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn model_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("models")
            .join(DEFAULT_EMBEDDING_MODEL)
    }

    fn require_model() -> PathBuf {
        let dir = model_dir();
        if !dir.join("model.onnx").exists() {
            panic!(
                "Model not found. Export with optimum:\n  \
                 optimum-cli export onnx --model sentence-transformers/{DEFAULT_EMBEDDING_MODEL} models/{DEFAULT_EMBEDDING_MODEL}"
            );
        }
        dir
    }

    fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn missing_model_dir_errors() {
        assert!(Embedder::load(Path::new("/nonexistent/model")).is_err());
    }

    #[test]
    #[ignore = "requires model files"]
    fn encode_is_normalized() {
        let embedder = Embedder::load(&require_model()).unwrap();
        let v = embedder.encode("derechos morales del autor").unwrap();
        assert_eq!(v.len(), embedder.dim());
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "expected unit norm, got {norm}");
    }

    #[test]
    #[ignore = "requires model files"]
    fn cross_lingual_similarity() {
        let embedder = Embedder::load(&require_model()).unwrap();
        let es = embedder.encode("derechos morales del autor").unwrap();
        let en = embedder.encode("moral rights of the author").unwrap();
        let tax = embedder.encode("impuesto sobre la renta").unwrap();
        assert!(cosine_sim(&es, &en) > cosine_sim(&es, &tax));
    }

    #[test]
    #[ignore = "requires model files"]
    fn empty_batch() {
        let embedder = Embedder::load(&require_model()).unwrap();
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }
}
