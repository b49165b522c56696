pub const VERSION: &str = env!("BUILD_VERSION");

// Tag written into every asset created by the load tester.
// Nodes used in production can filter these assets out by name.
pub const ASSET_NAME: &str = "BltAsset";

// Every transaction built by the tester has a single output
pub const OUTPUT_INDEX: u32 = 0;

// Version segment of the API descriptor exposed by the node root document
pub const API_VERSION: &str = "v1";

// Default path of the API relative to the node root url
pub const DEFAULT_API_PATH: &str = "/api/v1/";
