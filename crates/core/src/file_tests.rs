use super::*;

#[test]
fn text_file_encodes_as_utf8() {
    let f = File::text("main.py", "print(\"hi\")\n");
    assert_eq!(f.content_bytes(), b"print(\"hi\")\n".to_vec());
    assert_eq!(f.kind, FileKind::Text);
}

#[test]
fn binary_file_passes_through() {
    let bytes = vec![0u8, 1, 2, 255];
    let f = File::binary("blob.bin", bytes.clone());
    assert_eq!(f.content_bytes(), bytes);
    assert_eq!(f.kind, FileKind::Binary);
}

#[test]
fn deserializes_from_json_as_text() {
    let f: File = serde_json::from_str(r#"{"name":"a.txt","content":"hello"}"#).unwrap();
    assert_eq!(f.name, "a.txt");
    assert_eq!(f.content_bytes(), b"hello".to_vec());
    assert_eq!(f.kind, FileKind::Text);
}
