//! Streaming text transcoding for the local write path.
//!
//! Remote bytes are treated as UTF-8 text and re-encoded into the target
//! encoding. Chunk boundaries may split a multi-byte sequence; the decoder
//! keeps the partial sequence until the next chunk arrives.

use encoding_rs::{CoderResult, Decoder, Encoder, Encoding, UTF_8};

use crate::TransferError;

/// Labels that mean "write the bytes as they are".
const VERBATIM_LABELS: &[&str] = &["binary", "buffer", "raw"];

/// Stateful UTF-8 to `target` converter.
pub struct Transcoder {
    target: &'static Encoding,
    decoder: Decoder,
    encoder: Encoder,
    finished: bool,
}

impl std::fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcoder")
            .field("target", &self.target.name())
            .finish()
    }
}

impl Transcoder {
    /// Builds a transcoder for `label`.
    ///
    /// Returns `Ok(None)` when no conversion is needed: the verbatim
    /// labels and any label naming UTF-8. Labels encoding_rs cannot
    /// encode into (UTF-16, "replacement") are rejected.
    pub fn for_label(label: &str) -> Result<Option<Self>, TransferError> {
        let trimmed = label.trim();
        if VERBATIM_LABELS
            .iter()
            .any(|v| v.eq_ignore_ascii_case(trimmed))
        {
            return Ok(None);
        }

        let target = Encoding::for_label(trimmed.as_bytes()).ok_or_else(|| {
            TransferError::InvalidOptions(format!("unknown encoding: {label}"))
        })?;
        if target == UTF_8 {
            return Ok(None);
        }
        if target.output_encoding() != target {
            return Err(TransferError::InvalidOptions(format!(
                "cannot write {} output",
                target.name()
            )));
        }

        Ok(Some(Self {
            target,
            decoder: UTF_8.new_decoder_without_bom_handling(),
            encoder: target.new_encoder(),
            finished: false,
        }))
    }

    /// Canonical name of the target encoding.
    pub fn name(&self) -> &'static str {
        self.target.name()
    }

    /// Converts the next slice of input. Set `last` on the final call.
    ///
    /// Malformed UTF-8 becomes U+FFFD; characters the target cannot
    /// represent become numeric character references. Once a call with
    /// `last` has been made, further calls return nothing.
    pub fn transcode(&mut self, src: &[u8], last: bool) -> Vec<u8> {
        if self.finished {
            return Vec::new();
        }
        self.finished = last;

        let capacity = self
            .decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or(src.len().saturating_mul(3) + 4);
        let mut text = String::with_capacity(capacity);
        let mut consumed = 0;
        loop {
            let (result, read, _) = self.decoder.decode_to_string(&src[consumed..], &mut text, last);
            consumed += read;
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => text.reserve(src.len() - consumed + 16),
            }
        }

        let mut out = Vec::with_capacity(
            self.encoder
                .max_buffer_length_from_utf8_if_no_unmappables(text.len())
                .unwrap_or(text.len()),
        );
        let mut pos = 0;
        loop {
            let (result, read, _) = self
                .encoder
                .encode_from_utf8_to_vec(&text[pos..], &mut out, last);
            pos += read;
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => out.reserve(text.len() - pos + 16),
            }
        }
        out
    }

    /// Flushes anything still buffered at end of stream.
    ///
    /// Returns nothing if the stream was already finished.
    pub fn finish(&mut self) -> Vec<u8> {
        self.transcode(&[], true)
    }
}
