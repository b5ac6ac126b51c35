pub const APP_NAME: &str = "apistack";

/// Length of the truncated content hash used for templates and assets.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Length of the hash suffix appended to nested logical ids.
pub const LOGICAL_ID_HASH_LEN: usize = 8;

pub const DEFAULT_STACK_NAME: &str = "InfraStack";
pub const DEFAULT_OUT_DIR: &str = "apistack.out";
pub const CONFIG_FILENAME: &str = "apistack.toml";

/// Location of the externally built function, relative to the working directory.
pub const FUNCTION_MANIFEST_PATH: &str = "../lambda/api";
pub const FUNCTION_RUNTIME: &str = "provided.al2023";
pub const FUNCTION_HANDLER: &str = "bootstrap";
pub const FUNCTION_TIMEOUT_SECS: u32 = 10;

pub const BUCKET_NAME_ENV: &str = "BUCKET_NAME";

pub const API_URL_OUTPUT: &str = "api_url";
pub const BUCKET_NAME_OUTPUT: &str = "itemsBucketName";
