use rxdecode_core::MedicineInfo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::User;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user, as returned by the auth endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            image_url: user.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

/// Upload payload: the prescription image as base64, mirroring what the
/// OCR endpoint ultimately consumes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub image: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub extracted_text: String,
    pub medicines: Vec<MedicineInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub medicine: MedicineInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serializes_image_url_as_camel_case() {
        let user = PublicUser {
            id: Uuid::nil(),
            email: "a@b.c".to_string(),
            name: "Ada".to_string(),
            image_url: None,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("imageUrl").is_some());
        assert!(value.get("image_url").is_none());
    }

    #[test]
    fn upload_request_accepts_camel_case_file_name() {
        let req: UploadRequest =
            serde_json::from_str(r#"{"image":"aGVsbG8=","fileName":"rx.jpg"}"#).unwrap();
        assert_eq!(req.file_name.as_deref(), Some("rx.jpg"));
    }
}
