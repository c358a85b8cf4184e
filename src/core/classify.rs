use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::core::error::{ClientError, ClientResult};

/// Content-type tag for one logical job input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Image,
    Video,
    Text,
    Json,
    Audio,
    File,
}

/// Maps an input's logical name (parameter key or filename) to its content
/// type. The name `image` and the extensionless name `input` are matched
/// exactly before any extension sniffing; everything else is classified by
/// suffix. Unrecognized names are a hard failure, not a default.
pub fn input_type_from_name(name: &str) -> ClientResult<InputType> {
    let name = name.to_lowercase();
    if name == "image" {
        return Ok(InputType::Image);
    }
    if name == "input" {
        return Ok(InputType::File);
    }
    if name.ends_with(".jpg") {
        Ok(InputType::Image)
    } else if name.ends_with(".mp4") {
        Ok(InputType::Video)
    } else if name.ends_with(".txt") {
        Ok(InputType::Text)
    } else if name.ends_with(".json") {
        Ok(InputType::Json)
    } else if name.ends_with(".wav") || name.ends_with(".mp3") {
        // Both audio extensions are accepted; the service recognizes either.
        Ok(InputType::Audio)
    } else {
        Err(ClientError::Classification(name))
    }
}

/// Data-URI MIME prefix for a content type. The extension disambiguates the
/// image and audio containers; anything unrecognized falls back to the
/// default container for the type.
pub fn mime_prefix(input_type: InputType, extension: &str) -> &'static str {
    match input_type {
        InputType::Text | InputType::Json | InputType::File => "text/plain",
        InputType::Image => {
            if extension.eq_ignore_ascii_case("png") {
                "image/png"
            } else {
                "image/jpg"
            }
        }
        InputType::Video => "video/mp4",
        InputType::Audio => {
            if extension.eq_ignore_ascii_case("mp3") {
                "audio/mp3"
            } else {
                "audio/wav"
            }
        }
    }
}

/// Embeds raw bytes as a base64 data URI the way the service expects them.
pub fn data_uri(mime: &str, data: &[u8]) -> String {
    format!("data:{};charset=utf-8;base64,{}", mime, STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_exact_name_and_extension() {
        assert_eq!(input_type_from_name("x.jpg").unwrap(), InputType::Image);
        assert_eq!(input_type_from_name("image").unwrap(), InputType::Image);
        assert_eq!(input_type_from_name("x.mp4").unwrap(), InputType::Video);
        assert_eq!(input_type_from_name("x.txt").unwrap(), InputType::Text);
        assert_eq!(input_type_from_name("x.json").unwrap(), InputType::Json);
        assert_eq!(input_type_from_name("x.wav").unwrap(), InputType::Audio);
        assert_eq!(input_type_from_name("x.mp3").unwrap(), InputType::Audio);
        assert_eq!(input_type_from_name("input").unwrap(), InputType::File);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(input_type_from_name("PHOTO.JPG").unwrap(), InputType::Image);
        assert_eq!(input_type_from_name("Image").unwrap(), InputType::Image);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = input_type_from_name("x.xyz").unwrap_err();
        match err {
            ClientError::Classification(name) => assert_eq!(name, "x.xyz"),
            other => panic!("expected Classification error, got {other:?}"),
        }
    }

    #[test]
    fn mime_prefixes_follow_extension() {
        assert_eq!(mime_prefix(InputType::Text, "txt"), "text/plain");
        assert_eq!(mime_prefix(InputType::Image, "jpg"), "image/jpg");
        assert_eq!(mime_prefix(InputType::Image, "png"), "image/png");
        assert_eq!(mime_prefix(InputType::Video, "mp4"), "video/mp4");
        assert_eq!(mime_prefix(InputType::Audio, "wav"), "audio/wav");
        assert_eq!(mime_prefix(InputType::Audio, "mp3"), "audio/mp3");
    }

    #[test]
    fn data_uri_embeds_base64_payload() {
        let uri = data_uri("text/plain", b"hello");
        assert_eq!(uri, "data:text/plain;charset=utf-8;base64,aGVsbG8=");
    }
}
