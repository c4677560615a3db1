/// Minimal `multipart/form-data` encoder for single-file uploads.
///
/// `ureq` 2 sends raw bodies only, so the upload endpoints get their form
/// body built here: one part, one file, one boundary that does not occur in
/// the payload.
use super::types::UploadFile;

#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    /// Encode `file` as the only part, under form field `field`.
    pub fn single_file(field: &str, file: &UploadFile) -> Self {
        let boundary = boundary_for(&file.bytes);

        let mut bytes = Vec::with_capacity(file.bytes.len() + 256);
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_quoted(field),
                escape_quoted(&file.file_name),
            )
            .as_bytes(),
        );
        bytes.extend_from_slice(
            format!("Content-Type: {}\r\n\r\n", file.content_type()).as_bytes(),
        );
        bytes.extend_from_slice(&file.bytes);
        bytes.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Self { boundary, bytes }
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Pick a boundary that does not appear anywhere in `payload`.
fn boundary_for(payload: &[u8]) -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .unsigned_abs();
    let mut seed = nanos ^ u64::from(std::process::id()).rotate_left(32);

    loop {
        let candidate = format!("----elt-console-{seed:016x}");
        if !contains(payload, candidate.as_bytes()) {
            return candidate;
        }
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Quoted-string parameter values: drop line breaks, percent-encode quotes.
fn escape_quoted(value: &str) -> String {
    value.replace(['\r', '\n'], "").replace('"', "%22")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_layout() {
        let file = UploadFile::new("job.yaml", "source: api\n");
        let body = MultipartBody::single_file("file", &file);
        let text = String::from_utf8(body.as_bytes().to_vec()).unwrap();
        let boundary = body.boundary();

        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains(
            "Content-Disposition: form-data; name=\"file\"; filename=\"job.yaml\"\r\n"
        ));
        assert!(text.contains("Content-Type: application/x-yaml\r\n\r\nsource: api\n\r\n"));
        assert!(text.ends_with(&format!("\r\n--{boundary}--\r\n")));
        assert_eq!(
            body.content_type(),
            format!("multipart/form-data; boundary={boundary}")
        );
    }

    #[test]
    fn boundary_never_occurs_in_payload() {
        let file = UploadFile::new("job.yaml", "plain text");
        let first = MultipartBody::single_file("file", &file);

        // Craft a payload that embeds the boundary just produced; the encoder
        // has to choose another one.
        let tricky = UploadFile::new("job.yaml", format!("x{}y", first.boundary()));
        let body = MultipartBody::single_file("file", &tricky);
        assert!(!contains(&tricky.bytes, body.boundary().as_bytes()));
    }

    #[test]
    fn file_name_quotes_are_escaped() {
        let file = UploadFile::new("we\"ird\r\n.yaml", "a");
        let body = MultipartBody::single_file("file", &file);
        let text = String::from_utf8_lossy(body.as_bytes()).into_owned();
        assert!(text.contains("filename=\"we%22ird.yaml\""));
    }

    #[test]
    fn binary_payload_is_kept_verbatim() {
        let payload = vec![0u8, 159, 146, 150, 255];
        let file = UploadFile::new("blob.bin", payload.clone());
        let body = MultipartBody::single_file("file", &file);
        assert!(contains(body.as_bytes(), &payload));
    }
}
