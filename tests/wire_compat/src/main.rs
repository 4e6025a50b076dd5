fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use sealpost_protocol::{
        ChunkAck, FileList, ResumableList, TokenEnvelope, UntrustedClaims,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON
    /// values so renamed or dropped fields show up as a diff.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  service: {fixture}\n  client:  {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_inbox_files() {
        let list: FileList = roundtrip_test("inbox_files.json");
        let names: Vec<_> = list.files.iter().map(|f| f.base_name()).collect();
        assert_eq!(names, ["sample.txt.enc", "reads.bam.c4gh"]);
        assert_eq!(list.files[0].size, 65688);
    }

    #[test]
    fn fixture_outbox_files() {
        let list: FileList = roundtrip_test("outbox_files.json");
        assert_eq!(list.files[0].file_name, "test2.enc");
    }

    #[test]
    fn fixture_resumables() {
        let list: ResumableList = roundtrip_test("resumables.json");
        let record = &list.resumables[0];
        assert_eq!(record.id, "123");
        assert_eq!(record.name, "sample.txt.enc");
        assert_eq!(record.size, 32768);
        assert_eq!(record.chunk, 3);
    }

    #[test]
    fn fixture_chunk_ack() {
        let ack: ChunkAck = roundtrip_test("chunk_ack.json");
        assert_eq!(ack.id, "123");
    }

    #[test]
    fn fixture_token_envelope() {
        let envelope: TokenEnvelope = roundtrip_test("token_envelope.json");
        let claims = UntrustedClaims::decode(&envelope.token).unwrap();
        assert_eq!(claims.user, "p969-ega");
        assert_eq!(claims.exp, 1_893_456_000);
    }

    #[test]
    fn empty_listings_decode() {
        let files: FileList = serde_json::from_str("{}").unwrap();
        assert!(files.files.is_empty());
        let resumables: ResumableList = serde_json::from_str(r#"{"resumables":[]}"#).unwrap();
        assert!(resumables.resumables.is_empty());
    }
}
