use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ListId, NoteId, OrderId, PaymentStatus, ReviewStatus, UserId, UserProfile};

/// Finalized cascading-selector tuple. Sent as the query string of the note search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteQuery {
    pub region: String,
    pub institution_type: String,
    pub institution: String,
    pub course: String,
    pub semester: u32,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub note_id: NoteId,
    pub title: String,
    pub subject: String,
    pub institution: String,
    pub semester: u32,
    pub uploader_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f32>,
    #[serde(default)]
    pub price_paise: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDetail {
    #[serde(flatten)]
    pub summary: NoteSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub page_count: u32,
    pub status: ReviewStatus,
    #[serde(default)]
    pub purchased: bool,
    #[serde(default)]
    pub favourite: bool,
    #[serde(default)]
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Metadata sent alongside the raw PDF bytes on upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadNoteMeta {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub placement: NoteQuery,
    #[serde(default)]
    pub price_paise: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadNoteResponse {
    pub note_id: NoteId,
    pub status: ReviewStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateNoteRequest {
    pub stars: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub note_id: NoteId,
    pub average_rating: f32,
    pub rating_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingList {
    pub list_id: ListId,
    pub name: String,
    #[serde(default)]
    pub note_ids: Vec<NoteId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub note_id: NoteId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: OrderId,
    pub note_id: NoteId,
    pub amount_paise: u64,
    pub currency: String,
    /// Reference handed to the payment gateway checkout.
    pub gateway_order_ref: String,
    pub status: PaymentStatus,
}

/// Proof of payment relayed from the gateway checkout back to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub order_id: OrderId,
    pub gateway_payment_ref: String,
    pub gateway_signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub order_id: OrderId,
    pub note_id: NoteId,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReview {
    #[serde(flatten)]
    pub note: NoteSummary,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread: u32,
}
