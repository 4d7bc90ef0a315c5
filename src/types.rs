//! Voices, audio formats and speech requests.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum number of characters accepted for a single synthesis request.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Available voice characters for text-to-speech conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    Idera,
    Emma,
    Zainab,
    Osagie,
    Wura,
    Jude,
    Chinenye,
    Tayo,
    Regina,
    Femi,
    Adaora,
    Umar,
    Mary,
    Nonso,
    Remi,
    Adam,
}

impl Voice {
    /// All voices, in the order the API documents them.
    pub const ALL: [Voice; 16] = [
        Voice::Idera,
        Voice::Emma,
        Voice::Zainab,
        Voice::Osagie,
        Voice::Wura,
        Voice::Jude,
        Voice::Chinenye,
        Voice::Tayo,
        Voice::Regina,
        Voice::Femi,
        Voice::Adaora,
        Voice::Umar,
        Voice::Mary,
        Voice::Nonso,
        Voice::Remi,
        Voice::Adam,
    ];

    /// The wire name of the voice, as the API expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Idera => "Idera",
            Voice::Emma => "Emma",
            Voice::Zainab => "Zainab",
            Voice::Osagie => "Osagie",
            Voice::Wura => "Wura",
            Voice::Jude => "Jude",
            Voice::Chinenye => "Chinenye",
            Voice::Tayo => "Tayo",
            Voice::Regina => "Regina",
            Voice::Femi => "Femi",
            Voice::Adaora => "Adaora",
            Voice::Umar => "Umar",
            Voice::Mary => "Mary",
            Voice::Nonso => "Nonso",
            Voice::Remi => "Remi",
            Voice::Adam => "Adam",
        }
    }

    /// Short character description, as shown by `yarntts voices`.
    pub fn description(&self) -> &'static str {
        match self {
            Voice::Idera => "Melodic, gentle",
            Voice::Emma => "Authoritative, deep",
            Voice::Zainab => "Soothing, gentle",
            Voice::Osagie => "Smooth, calm",
            Voice::Wura => "Young, sweet",
            Voice::Jude => "Warm, confident",
            Voice::Chinenye => "Engaging, warm",
            Voice::Tayo => "Upbeat, energetic",
            Voice::Regina => "Mature, warm",
            Voice::Femi => "Rich, reassuring",
            Voice::Adaora => "Warm, engaging",
            Voice::Umar => "Calm, smooth",
            Voice::Mary => "Energetic, youthful",
            Voice::Nonso => "Bold, resonant",
            Voice::Remi => "Melodious, warm",
            Voice::Adam => "Deep, clear",
        }
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        Voice::ALL
            .into_iter()
            .find(|v| v.as_str().to_lowercase() == lower)
            .ok_or_else(|| Error::validation(format!("Unknown voice: {}", s)))
    }
}

/// Supported audio output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
    Opus,
    Flac,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 4] = [
        AudioFormat::Mp3,
        AudioFormat::Wav,
        AudioFormat::Opus,
        AudioFormat::Flac,
    ];

    /// Wire value and file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Opus => "opus",
            AudioFormat::Flac => "flac",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Opus => "audio/opus",
            AudioFormat::Flac => "audio/flac",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            "opus" => Ok(AudioFormat::Opus),
            "flac" => Ok(AudioFormat::Flac),
            other => Err(Error::validation(format!("Unknown audio format: {}", other))),
        }
    }
}

/// One synthesis job: the text plus optional voice and output format.
///
/// Immutable once constructed; each request is owned by the call that
/// created it, so concurrent batch items never share mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    text: String,
    voice: Option<Voice>,
    format: Option<AudioFormat>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            format: None,
        }
    }

    /// Voice character to use. The API defaults to Idera when unset.
    pub fn voice(mut self, voice: Voice) -> Self {
        self.voice = Some(voice);
        self
    }

    /// Output audio format. The API defaults to mp3 when unset.
    pub fn format(mut self, format: AudioFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice_opt(&self) -> Option<Voice> {
        self.voice
    }

    /// The format the response will carry, accounting for the API default.
    pub fn output_format(&self) -> AudioFormat {
        self.format.unwrap_or(AudioFormat::Mp3)
    }

    /// Local request validation; invalid requests never reach the transport.
    pub fn validate(&self) -> Result<()> {
        if self.text.is_empty() {
            return Err(Error::validation("Text cannot be empty"));
        }
        if self.text.chars().count() > MAX_TEXT_LENGTH {
            return Err(Error::validation(format!(
                "Text length ({}) exceeds maximum of {} characters",
                self.text.chars().count(),
                MAX_TEXT_LENGTH
            )));
        }
        Ok(())
    }

    /// JSON body for the `/tts` endpoint.
    pub fn to_payload(&self) -> serde_json::Value {
        let mut body = serde_json::json!({ "text": self.text });
        if let Some(voice) = self.voice {
            body["voice"] = serde_json::Value::String(voice.as_str().to_string());
        }
        if let Some(format) = self.format {
            body["response_format"] = serde_json::Value::String(format.as_str().to_string());
        }
        body
    }
}

/// Synthesized audio returned by the API.
#[derive(Debug, Clone)]
pub struct AudioOutput {
    pub data: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioOutput {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_round_trips_through_from_str() {
        for voice in Voice::ALL {
            assert_eq!(voice.as_str().parse::<Voice>().unwrap(), voice);
            // CLI input is usually lowercase
            assert_eq!(
                voice.as_str().to_lowercase().parse::<Voice>().unwrap(),
                voice
            );
        }
    }

    #[test]
    fn unknown_voice_is_a_validation_error() {
        let err = "Siri".parse::<Voice>().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn unknown_format_is_a_validation_error() {
        let err = "ogg".parse::<AudioFormat>().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn empty_text_rejected_locally() {
        let err = SpeechRequest::new("").validate().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn oversized_text_rejected_locally() {
        let req = SpeechRequest::new("a".repeat(MAX_TEXT_LENGTH + 1));
        let err = req.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn text_at_the_limit_is_accepted() {
        let req = SpeechRequest::new("a".repeat(MAX_TEXT_LENGTH));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn payload_omits_unset_fields() {
        let payload = SpeechRequest::new("hello").to_payload();
        assert_eq!(payload, serde_json::json!({ "text": "hello" }));
    }

    #[test]
    fn payload_carries_voice_and_format() {
        let payload = SpeechRequest::new("hello")
            .voice(Voice::Emma)
            .format(AudioFormat::Wav)
            .to_payload();
        assert_eq!(
            payload,
            serde_json::json!({
                "text": "hello",
                "voice": "Emma",
                "response_format": "wav",
            })
        );
    }

    #[test]
    fn output_format_defaults_to_mp3() {
        assert_eq!(SpeechRequest::new("x").output_format(), AudioFormat::Mp3);
    }
}
