use serde::Deserialize;

/// Body of POST /knowledgebase/files, sent after a successful upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFileRequest {
    pub user_id: String,
    pub name: String,
    pub url: String,
    pub size: u64,
    pub key: String,
}

/// Body of DELETE /knowledgebase/files.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFilesRequest {
    pub user_id: String,
    pub file_keys: Vec<String>,
}
