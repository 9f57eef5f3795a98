use axum::extract::Multipart;

use crate::error_handler::{AppError, AppResult};

/// Multipart body of POST /forge: `userId` plus `fileIds`, a JSON array of
/// knowledgebase file keys in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeRequest {
    pub user_id: String,
    pub file_ids: Vec<String>,
}

impl ForgeRequest {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut user_id = None;
        let mut file_ids = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("userId") => user_id = Some(field.text().await?),
                Some("fileIds") => file_ids = Some(parse_file_ids(&field.text().await?)?),
                _ => {}
            }
        }

        let user_id = user_id
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::BadRequest("userId is required".into()))?;
        let file_ids = file_ids
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| AppError::BadRequest("fileIds must list at least one file".into()))?;

        Ok(Self { user_id, file_ids })
    }
}

fn parse_file_ids(raw: &str) -> AppResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw)
        .map_err(|e| AppError::BadRequest(format!("fileIds must be a JSON array of strings: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_ids_are_a_json_string_array() {
        assert_eq!(parse_file_ids(r#"["k1","k2"]"#).unwrap(), vec!["k1", "k2"]);
        assert!(parse_file_ids("k1,k2").is_err());
        assert!(parse_file_ids("[1,2]").is_err());
    }
}
