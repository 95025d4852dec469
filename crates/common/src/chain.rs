/// Maps a chain identifier to the name used by the Seven Seas indexer.
///
/// `"mainnet"` is published under `"ethereum"`, every other chain passes
/// through lower-cased.
pub fn normalize_chain_name(chain: &str) -> String {
    let lowered = chain.trim().to_lowercase();
    if lowered == "mainnet" {
        "ethereum".to_string()
    } else {
        lowered
    }
}
