//! Client-side upload gating: extension whitelists and the size cap.

/// Capture files accepted by the PCAP page.
pub const PCAP_EXTENSIONS: &[&str] = &["pcap", "pcapng", "cap"];

/// Model artifacts accepted by the AI models import dialog.
pub const MODEL_EXTENSIONS: &[&str] = &["pkl", "h5", "onnx", "pt", "pth", "joblib", "json"];

/// Maximum accepted upload size: 100 MB.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Whether `filename` carries one of the whitelisted extensions
/// (case-insensitive).
pub fn extension_allowed(filename: &str, whitelist: &[&str]) -> bool {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_lowercase();
    whitelist.iter().any(|w| *w == ext)
}

/// Validate an upload candidate. Returns an inline-displayable rejection
/// message, or `None` when the file is acceptable.
pub fn validate_upload(filename: &str, size: u64, whitelist: &[&str]) -> Option<String> {
    if !extension_allowed(filename, whitelist) {
        return Some(format!(
            "Unsupported file type. Allowed: {}",
            whitelist
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(" ")
        ));
    }
    if size > MAX_UPLOAD_BYTES {
        return Some("File exceeds the 100 MB upload limit".into());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcap_whitelist() {
        assert!(extension_allowed("capture.pcap", PCAP_EXTENSIONS));
        assert!(extension_allowed("CAPTURE.PCAPNG", PCAP_EXTENSIONS));
        assert!(extension_allowed("trace.cap", PCAP_EXTENSIONS));
        assert!(!extension_allowed("notes.txt", PCAP_EXTENSIONS));
        assert!(!extension_allowed("pcap", PCAP_EXTENSIONS)); // no dot
    }

    #[test]
    fn size_cap_enforced() {
        assert!(validate_upload("a.pcap", MAX_UPLOAD_BYTES, PCAP_EXTENSIONS).is_none());
        let msg = validate_upload("a.pcap", MAX_UPLOAD_BYTES + 1, PCAP_EXTENSIONS);
        assert!(msg.is_some_and(|m| m.contains("100 MB")));
    }

    #[test]
    fn rejection_message_lists_extensions() {
        let msg = validate_upload("weights.bin", 10, MODEL_EXTENSIONS);
        assert!(msg.is_some_and(|m| m.contains(".onnx")));
    }
}
