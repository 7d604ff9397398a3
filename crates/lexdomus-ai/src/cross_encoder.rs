//! ONNX cross-encoder scoring (query, passage) pairs for reranking.
//!
//! Expects a sequence-classification export with a single relevance logit per
//! pair (`[batch, 1]`); two-class exports use the positive-class logit.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use lexdomus_core::RelevanceModel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

pub const DEFAULT_RERANK_MODEL: &str = "mmarco-mMiniLMv2-L12-H384-v1";

pub struct CrossEncoder {
    name: String,
    model: Arc<PairModel>,
}

struct PairModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    token_types: bool,
}

impl CrossEncoder {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let token_types = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: 512,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

        let name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cross-encoder".into());
        info!(model = %name, token_types, "loaded cross-encoder");
        Ok(Self {
            name,
            model: Arc::new(PairModel {
                session: Mutex::new(session),
                tokenizer,
                token_types,
            }),
        })
    }

    /// One logit per passage. Blocks the calling thread for the whole inference.
    pub fn score(&self, query: &str, passages: &[&str]) -> anyhow::Result<Vec<f32>> {
        self.model.score(query, passages)
    }
}

impl PairModel {
    fn score(&self, query: &str, passages: &[&str]) -> anyhow::Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(vec![]);
        }
        let batch_size = passages.len();
        let pairs: Vec<(&str, &str)> = passages.iter().map(|p| (query, *p)).collect();
        let encodings = self
            .tokenizer
            .encode_batch(pairs, true)
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
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("cross-encoder session poisoned"))?;
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

        let (output_shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 2 && dims[0] as usize == batch_size && dims[1] >= 1,
            "unexpected logits shape: {dims:?}, expected [{batch_size}, 1]"
        );
        let classes = dims[1] as usize;
        Ok((0..batch_size)
            .map(|i| logits[i * classes + classes - 1])
            .collect())
    }
}

#[async_trait]
impl RelevanceModel for CrossEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn score_pairs(&self, query: &str, passages: &[&str]) -> anyhow::Result<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let query = query.to_owned();
        let passages: Vec<String> = passages.iter().map(|p| (*p).to_owned()).collect();
        tokio::task::spawn_blocking(move || {
            let passages: Vec<&str> = passages.iter().map(String::as_str).collect();
            model.score(&query, &passages)
        })
        .await
        .map_err(|e| anyhow::anyhow!("cross-encoder task failed: {e}"))?
    }
}
