use super::capture::{AudioChunk, CaptureFormat};
use crate::{ChatError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Finalized recording, ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl AudioBlob {
    /// Assemble buffered PCM chunks into a single WAV object.
    ///
    /// Chunk boundaries need not align with samples.
    pub fn assemble(chunks: &[AudioChunk], format: &CaptureFormat) -> Result<Self> {
        let pcm_len: usize = chunks.iter().map(Vec::len).sum();
        if pcm_len < 2 {
            return Err(ChatError::EmptyRecording);
        }

        let spec = WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(pcm_len + 44));
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| ChatError::IOError(format!("Failed to initialize WAV writer: {}", e)))?;

        let mut low_byte = None;
        for &byte in chunks.iter().flatten() {
            match low_byte.take() {
                None => low_byte = Some(byte),
                Some(low) => writer
                    .write_sample(i16::from_le_bytes([low, byte]))
                    .map_err(|e| ChatError::IOError(format!("Failed to write WAV sample: {}", e)))?,
            }
        }

        writer
            .finalize()
            .map_err(|e| ChatError::IOError(format!("Failed to finalize WAV data: {}", e)))?;

        Ok(Self {
            bytes: cursor.into_inner(),
            mime_type: format.mime_type.clone(),
            file_name: "recording.wav".to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
