//! `multipart/form-data` decoder.
//!
//! Parses a raw request body into named form fields and file parts by
//! scanning for the boundary marker, independent of the HTTP framework.
//! Part bodies are preserved byte-exact, so binary uploads survive the
//! round trip.

use crate::error::{Result, RoloError};

/// A single decoded part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// The `name` attribute of the `Content-Disposition` header.
    pub name: String,
    /// The `filename` attribute, when present. Its presence classifies the
    /// part as a file upload rather than a plain form field.
    pub file_name: Option<String>,
    /// The part's `Content-Type` header, when present.
    pub content_type: Option<String>,
    /// Raw body bytes of the part.
    pub data: Vec<u8>,
}

impl Part {
    /// A part is a file upload when the client sent a filename.
    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }

    /// The part body as lossy UTF-8, for form fields.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Extract the boundary parameter from a `multipart/form-data` content type.
///
/// Handles quoted and unquoted boundary values; returns `None` when the
/// content type is not multipart or carries no boundary.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    let mut segments = content_type.split(';');
    let mime = segments.next()?.trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }

    for segment in segments {
        let segment = segment.trim();
        if let Some(value) = segment.strip_prefix("boundary=") {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Parse a multipart body into its parts.
///
/// Tolerates a preamble before the first boundary and an epilogue after the
/// closing `--boundary--` delimiter. Fails when the boundary never occurs,
/// when a part has no header/body separator, or when `Content-Disposition`
/// is missing or carries no `name`.
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<Part>> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut pos = match find(body, delimiter, 0) {
        Some(idx) => idx + delimiter.len(),
        None => {
            return Err(RoloError::Multipart(format!(
                "Boundary '{boundary}' not found in request body"
            )));
        }
    };

    loop {
        // The delimiter is followed by "--" (close), or CRLF and a part.
        if body[pos..].starts_with(b"--") {
            break;
        }
        pos = skip_crlf(body, pos);

        let next_delim = match find(body, delimiter, pos) {
            Some(idx) => idx,
            None => {
                return Err(RoloError::Multipart(
                    "Unterminated multipart body: missing closing boundary".to_string(),
                ));
            }
        };

        // Part content ends just before the CRLF preceding the delimiter.
        let mut content_end = next_delim;
        if content_end >= 2 && &body[content_end - 2..content_end] == b"\r\n" {
            content_end -= 2;
        }

        parts.push(parse_part(&body[pos..content_end])?);
        pos = next_delim + delimiter.len();
    }

    Ok(parts)
}

fn parse_part(raw: &[u8]) -> Result<Part> {
    let header_end = find(raw, b"\r\n\r\n", 0).ok_or_else(|| {
        RoloError::Multipart("Malformed part: missing header terminator".to_string())
    })?;

    let headers = String::from_utf8_lossy(&raw[..header_end]);
    let data = raw[header_end + 4..].to_vec();

    let mut name = None;
    let mut file_name = None;
    let mut content_type = None;

    for line in headers.split("\r\n") {
        let Some((header, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        if header.eq_ignore_ascii_case("content-disposition") {
            for attr in value.split(';') {
                let attr = attr.trim();
                if let Some(v) = attr.strip_prefix("name=") {
                    name = Some(unquote(v));
                } else if let Some(v) = attr.strip_prefix("filename=") {
                    file_name = Some(unquote(v));
                }
            }
        } else if header.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.to_string());
        }
    }

    let name = name.ok_or_else(|| {
        RoloError::Multipart("Malformed part: Content-Disposition missing 'name'".to_string())
    })?;

    Ok(Part {
        name,
        file_name,
        content_type,
        data,
    })
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

fn skip_crlf(body: &[u8], pos: usize) -> usize {
    if body[pos..].starts_with(b"\r\n") {
        pos + 2
    } else {
        pos
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|idx| idx + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----RoloBoundary7MA4YWxk";

    fn field(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file(name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        out.extend_from_slice(data);
        out.extend_from_slice(b"\r\n");
        out
    }

    fn close() -> String {
        format!("--{BOUNDARY}--\r\n")
    }

    #[test]
    fn parses_single_field() {
        let body = format!("{}{}", field("tags", "conference"), close());
        let parts = parse(body.as_bytes(), BOUNDARY).unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "tags");
        assert!(!parts[0].is_file());
        assert_eq!(parts[0].text(), "conference");
    }

    #[test]
    fn parses_mixed_fields_and_files() {
        let binary = [0u8, 159, 146, 150, 13, 10, 0];
        let mut body = field("notes", "met at expo").into_bytes();
        body.extend(file("image", "card.png", "image/png", &binary));
        body.extend(field("tags", "expo").into_bytes());
        body.extend(close().into_bytes());

        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts.len(), 3);

        assert_eq!(parts[0].name, "notes");
        assert!(!parts[0].is_file());

        assert_eq!(parts[1].name, "image");
        assert!(parts[1].is_file());
        assert_eq!(parts[1].file_name.as_deref(), Some("card.png"));
        assert_eq!(parts[1].content_type.as_deref(), Some("image/png"));
        assert_eq!(parts[1].data, binary, "binary body must survive byte-exact");

        assert_eq!(parts[2].name, "tags");
        assert_eq!(parts[2].text(), "expo");
    }

    #[test]
    fn parses_many_parts_in_order() {
        let mut body = Vec::new();
        for i in 0..10 {
            body.extend(field(&format!("field{i}"), &format!("value{i}")).into_bytes());
        }
        body.extend(close().into_bytes());

        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts.len(), 10);
        for (i, part) in parts.iter().enumerate() {
            assert_eq!(part.name, format!("field{i}"));
            assert_eq!(part.text(), format!("value{i}"));
        }
    }

    #[test]
    fn tolerates_preamble_and_epilogue() {
        let mut body = b"This preamble should be ignored\r\n".to_vec();
        body.extend(field("a", "1").into_bytes());
        body.extend(close().into_bytes());
        body.extend_from_slice(b"trailing epilogue bytes");

        let parts = parse(&body, BOUNDARY).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].text(), "1");
    }

    #[test]
    fn rejects_body_without_boundary() {
        let err = parse(b"no multipart here", BOUNDARY).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn rejects_part_without_header_terminator() {
        let body = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"x\"\r\n");
        let err = parse(body.as_bytes(), BOUNDARY).unwrap_err();
        assert!(matches!(err, RoloError::Multipart(_)));
    }

    #[test]
    fn rejects_part_without_name() {
        let body =
            format!("--{BOUNDARY}\r\nContent-Type: text/plain\r\n\r\nhello\r\n{}", close());
        let err = parse(body.as_bytes(), BOUNDARY).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn empty_part_body_is_preserved() {
        let body = format!("{}{}", field("empty", ""), close());
        let parts = parse(body.as_bytes(), BOUNDARY).unwrap();
        assert_eq!(parts[0].data, b"");
    }

    #[test]
    fn boundary_from_content_type_plain() {
        let ct = format!("multipart/form-data; boundary={BOUNDARY}");
        assert_eq!(boundary_from_content_type(&ct).as_deref(), Some(BOUNDARY));
    }

    #[test]
    fn boundary_from_content_type_quoted() {
        let ct = format!("multipart/form-data; boundary=\"{BOUNDARY}\"");
        assert_eq!(boundary_from_content_type(&ct).as_deref(), Some(BOUNDARY));
    }

    #[test]
    fn boundary_from_content_type_rejects_non_multipart() {
        assert!(boundary_from_content_type("application/json").is_none());
        assert!(boundary_from_content_type("multipart/form-data").is_none());
    }
}
