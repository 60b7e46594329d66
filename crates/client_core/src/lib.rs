use std::collections::HashMap;

use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{ListId, NoteId, PaymentStatus, ReviewStatus},
    error::{ApiError, ErrorCode},
    protocol::{
        CreateOrderRequest, LoginRequest, LoginResponse, NoteDetail, NoteQuery, NoteSummary,
        PaymentConfirmation, PaymentOrder, PaymentReceipt, PendingReview, RateNoteRequest,
        RatingSummary, ReadingList, RegisterRequest, ReviewDecision, UnreadCountResponse,
        UploadNoteMeta, UploadNoteResponse,
    },
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub mod config;
pub mod context;
pub mod error;
pub mod optimistic;
pub mod paywall;

pub use config::{load_settings, Settings};
pub use context::{AppContext, ClientEvent, Session};
pub use error::{ClientError, ClientResult};
pub use optimistic::{OptimisticSet, PendingToggle, ToggleError};
pub use paywall::{PageAccess, PaywallGate, PaywallPolicy};

const PDF_MAGIC: &[u8] = b"%PDF-";
const MIN_PASSWORD_LEN: usize = 8;

/// Typed client for the notes REST backend.
///
/// Favourites and reading-list membership are kept locally and flipped before the request
/// is sent; a refused request restores the previous membership.
pub struct NotesClient {
    http: Client,
    settings: Settings,
    context: AppContext,
    favourites: Mutex<OptimisticSet<NoteId>>,
    lists: Mutex<HashMap<ListId, OptimisticSet<NoteId>>>,
}

impl NotesClient {
    pub fn new(mut settings: Settings, context: AppContext) -> ClientResult<Self> {
        settings.api_base_url = config::parse_base_url(&settings.api_base_url)
            .map_err(|err| ClientError::validation(format!("{err:#}")))?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            http,
            settings,
            context,
            favourites: Mutex::new(OptimisticSet::new()),
            lists: Mutex::new(HashMap::new()),
        })
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn paywall_for(&self, note: &NoteDetail) -> PaywallGate {
        PaywallGate::for_note(self.settings.paywall_policy(), note)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.settings.api_base_url)
    }

    async fn require_session(&self) -> ClientResult<Session> {
        self.context.session().await.ok_or(ClientError::NotLoggedIn)
    }

    async fn require_admin(&self) -> ClientResult<Session> {
        let session = self.require_session().await?;
        if !session.user.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        Ok(session)
    }

    async fn with_optional_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.context.session().await {
            Some(session) => request.bearer_auth(session.token),
            None => request,
        }
    }

    /// Sends `request` and turns non-2xx answers into [`ClientError::Api`]. A 401 ends the
    /// session so the front-end routes back to sign-in.
    async fn execute(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let error = serde_json::from_slice::<ApiError>(&body).unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(&body).trim().to_string();
            let message = if text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text
            };
            ApiError::new(ErrorCode::from_status(status.as_u16()), message)
        });

        if error.requires_reauth() {
            warn!(status = status.as_u16(), "session: rejected by server, signing out");
            self.context.end_session().await;
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            error,
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        Ok(self.execute(request).await?.json().await?)
    }

    pub async fn register(&self, request: RegisterRequest) -> ClientResult<Session> {
        if request.name.trim().is_empty() {
            return Err(ClientError::validation("name must not be empty"));
        }
        if !request.email.contains('@') {
            return Err(ClientError::validation("email address is malformed"));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let response: LoginResponse = self
            .fetch_json(
                self.http
                    .post(self.endpoint("auth/register"))
                    .json(&request),
            )
            .await?;
        Ok(self.adopt_login(response).await)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let response: LoginResponse = self
            .fetch_json(self.http.post(self.endpoint("auth/login")).json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            }))
            .await?;
        Ok(self.adopt_login(response).await)
    }

    async fn adopt_login(&self, response: LoginResponse) -> Session {
        let session = Session {
            token: response.token,
            user: response.user,
            expires_at: response.expires_at,
        };
        self.forget_memberships().await;
        self.context.start_session(session.clone()).await;
        session
    }

    /// Ends the local session even when the server cannot be reached.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Some(session) = self.context.session().await {
            let request = self
                .http
                .post(self.endpoint("auth/logout"))
                .bearer_auth(session.token);
            if let Err(err) = self.execute(request).await {
                warn!("session: server-side logout failed: {err}");
            }
        }
        self.forget_memberships().await;
        self.context.end_session().await;
        Ok(())
    }

    /// Sets are cleared in place, never dropped, so toggles still in flight for the previous
    /// account resolve as stale instead of landing in the next one.
    async fn forget_memberships(&self) {
        self.favourites.lock().await.clear();
        for set in self.lists.lock().await.values_mut() {
            set.clear();
        }
    }

    pub async fn search_notes(&self, query: &NoteQuery) -> ClientResult<Vec<NoteSummary>> {
        let request = self
            .with_optional_auth(self.http.get(self.endpoint("notes/search")).query(query))
            .await;
        let notes: Vec<NoteSummary> = self.fetch_json(request).await?;
        info!(
            subject = %query.subject,
            semester = query.semester,
            results = notes.len(),
            "notes: search completed"
        );
        Ok(notes)
    }

    pub async fn note_detail(&self, note_id: NoteId) -> ClientResult<NoteDetail> {
        let request = self
            .with_optional_auth(self.http.get(self.endpoint(&format!("notes/{note_id}"))))
            .await;
        let detail: NoteDetail = self.fetch_json(request).await?;
        if self.context.session().await.is_some() {
            self.favourites
                .lock()
                .await
                .observe(note_id, detail.favourite);
        }
        Ok(detail)
    }

    /// Raw PDF bytes; rendering is left to the viewer.
    pub async fn download_note(&self, note_id: NoteId) -> ClientResult<Vec<u8>> {
        let session = self.require_session().await?;
        let bytes = self
            .execute(
                self.http
                    .get(self.endpoint(&format!("notes/{note_id}/file")))
                    .bearer_auth(session.token),
            )
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }

    pub async fn upload_note(
        &self,
        meta: UploadNoteMeta,
        pdf: Vec<u8>,
    ) -> ClientResult<UploadNoteResponse> {
        let session = self.require_session().await?;
        if meta.title.trim().is_empty() {
            return Err(ClientError::validation("title must not be empty"));
        }
        if !pdf.starts_with(PDF_MAGIC) {
            return Err(ClientError::validation("only PDF documents can be uploaded"));
        }
        if pdf.len() as u64 > self.settings.max_upload_bytes {
            return Err(ClientError::validation(format!(
                "file is {} bytes, the limit is {} bytes",
                pdf.len(),
                self.settings.max_upload_bytes
            )));
        }

        let size_bytes = pdf.len();
        let response: UploadNoteResponse = self
            .fetch_json(
                self.http
                    .post(self.endpoint("notes"))
                    .bearer_auth(session.token)
                    .query(&meta)
                    .header(header::CONTENT_TYPE, "application/pdf")
                    .body(pdf),
            )
            .await?;
        info!(
            note_id = response.note_id.0,
            size_bytes,
            status = ?response.status,
            "notes: uploaded"
        );
        Ok(response)
    }

    pub async fn rate_note(&self, note_id: NoteId, stars: u8) -> ClientResult<RatingSummary> {
        let session = self.require_session().await?;
        if !(1..=5).contains(&stars) {
            return Err(ClientError::validation("rating must be between 1 and 5 stars"));
        }
        self.fetch_json(
            self.http
                .post(self.endpoint(&format!("notes/{note_id}/ratings")))
                .bearer_auth(session.token)
                .json(&RateNoteRequest { stars }),
        )
        .await
    }

    pub async fn is_favourite(&self, note_id: NoteId) -> bool {
        self.favourites.lock().await.contains(&note_id)
    }

    /// Loads the favourites page and resynchronizes local membership.
    pub async fn favourites(&self) -> ClientResult<Vec<NoteSummary>> {
        let session = self.require_session().await?;
        let notes: Vec<NoteSummary> = self
            .fetch_json(
                self.http
                    .get(self.endpoint("favourites"))
                    .bearer_auth(session.token),
            )
            .await?;
        self.favourites
            .lock()
            .await
            .replace_all(notes.iter().map(|note| note.note_id));
        Ok(notes)
    }

    /// Flips the favourite flag locally, then persists it. Returns the new state.
    pub async fn toggle_favourite(&self, note_id: NoteId) -> ClientResult<bool> {
        let session = self.require_session().await?;
        let pending = self.favourites.lock().await.begin_toggle(note_id)?;
        let favourite = pending.is_member();
        let url = self.endpoint(&format!("favourites/{note_id}"));
        let request = if favourite {
            self.http.put(url)
        } else {
            self.http.delete(url)
        };

        match self.execute(request.bearer_auth(session.token)).await {
            Ok(_) => {
                if self.favourites.lock().await.commit(pending) {
                    info!(note_id = note_id.0, favourite, "notes: favourite saved");
                    self.context.emit(ClientEvent::FavouriteChanged { note_id, favourite });
                } else {
                    debug!(note_id = note_id.0, "notes: favourite saved for a previous session");
                }
                Ok(favourite)
            }
            Err(err) => {
                if self.favourites.lock().await.rollback(pending) {
                    warn!(note_id = note_id.0, "notes: favourite change rolled back: {err}");
                    self.context.emit(ClientEvent::Error(err.to_string()));
                }
                Err(err)
            }
        }
    }

    pub async fn reading_lists(&self) -> ClientResult<Vec<ReadingList>> {
        let session = self.require_session().await?;
        let lists: Vec<ReadingList> = self
            .fetch_json(self.http.get(self.endpoint("lists")).bearer_auth(session.token))
            .await?;
        {
            let mut guard = self.lists.lock().await;
            for (list_id, set) in guard.iter_mut() {
                if !lists.iter().any(|list| list.list_id == *list_id) {
                    set.clear();
                }
            }
            for list in &lists {
                guard
                    .entry(list.list_id)
                    .or_default()
                    .replace_all(list.note_ids.iter().copied());
            }
        }
        Ok(lists)
    }

    pub async fn list_contains(&self, list_id: ListId, note_id: NoteId) -> bool {
        self.lists
            .lock()
            .await
            .get(&list_id)
            .is_some_and(|set| set.contains(&note_id))
    }

    /// Adds `note_id` to the list or removes it, optimistically. Returns the new membership.
    pub async fn toggle_in_list(&self, list_id: ListId, note_id: NoteId) -> ClientResult<bool> {
        let session = self.require_session().await?;
        let pending = self
            .lists
            .lock()
            .await
            .entry(list_id)
            .or_default()
            .begin_toggle(note_id)?;
        let member = pending.is_member();
        let url = self.endpoint(&format!("lists/{list_id}/notes/{note_id}"));
        let request = if member {
            self.http.put(url)
        } else {
            self.http.delete(url)
        };

        let outcome = self.execute(request.bearer_auth(session.token)).await;
        let mut guard = self.lists.lock().await;
        let set = guard.entry(list_id).or_default();
        match outcome {
            Ok(_) => {
                let current = set.commit(pending);
                drop(guard);
                if current {
                    info!(
                        list_id = list_id.0,
                        note_id = note_id.0,
                        member,
                        "notes: list membership saved"
                    );
                    self.context.emit(ClientEvent::ListMembershipChanged {
                        list_id,
                        note_id,
                        member,
                    });
                }
                Ok(member)
            }
            Err(err) => {
                let current = set.rollback(pending);
                drop(guard);
                if current {
                    warn!(
                        list_id = list_id.0,
                        note_id = note_id.0,
                        "notes: list membership change rolled back: {err}"
                    );
                    self.context.emit(ClientEvent::Error(err.to_string()));
                }
                Err(err)
            }
        }
    }

    pub async fn create_order(&self, note_id: NoteId) -> ClientResult<PaymentOrder> {
        let session = self.require_session().await?;
        let order: PaymentOrder = self
            .fetch_json(
                self.http
                    .post(self.endpoint("payments/orders"))
                    .bearer_auth(session.token)
                    .json(&CreateOrderRequest { note_id }),
            )
            .await?;
        info!(
            order_id = order.order_id.0,
            note_id = note_id.0,
            amount_paise = order.amount_paise,
            "payments: order created"
        );
        Ok(order)
    }

    pub async fn confirm_payment(
        &self,
        confirmation: PaymentConfirmation,
    ) -> ClientResult<PaymentReceipt> {
        let session = self.require_session().await?;
        if confirmation.gateway_payment_ref.trim().is_empty()
            || confirmation.gateway_signature.trim().is_empty()
        {
            return Err(ClientError::validation(
                "payment confirmation is missing gateway references",
            ));
        }
        let receipt: PaymentReceipt = self
            .fetch_json(
                self.http
                    .post(self.endpoint("payments/confirm"))
                    .bearer_auth(session.token)
                    .json(&confirmation),
            )
            .await?;
        if receipt.status == PaymentStatus::Captured {
            info!(
                order_id = receipt.order_id.0,
                note_id = receipt.note_id.0,
                "payments: captured"
            );
            self.context.emit(ClientEvent::NotePurchased {
                note_id: receipt.note_id,
            });
        } else {
            warn!(
                order_id = receipt.order_id.0,
                status = ?receipt.status,
                "payments: not captured"
            );
        }
        Ok(receipt)
    }

    pub async fn pending_reviews(&self) -> ClientResult<Vec<PendingReview>> {
        let session = self.require_admin().await?;
        self.fetch_json(
            self.http
                .get(self.endpoint("admin/notes/pending"))
                .bearer_auth(session.token),
        )
        .await
    }

    pub async fn review_note(&self, note_id: NoteId, decision: ReviewDecision) -> ClientResult<()> {
        let session = self.require_admin().await?;
        match decision.status {
            ReviewStatus::Pending => {
                return Err(ClientError::validation(
                    "a review must approve or reject the note",
                ))
            }
            ReviewStatus::Rejected
                if decision
                    .reason
                    .as_deref()
                    .map_or(true, |reason| reason.trim().is_empty()) =>
            {
                return Err(ClientError::validation("rejecting a note needs a reason"))
            }
            _ => {}
        }
        self.execute(
            self.http
                .post(self.endpoint(&format!("admin/notes/{note_id}/review")))
                .bearer_auth(session.token)
                .json(&decision),
        )
        .await?;
        info!(note_id = note_id.0, status = ?decision.status, "admin: review recorded");
        Ok(())
    }

    pub async fn refresh_unread_count(&self) -> ClientResult<u32> {
        let session = self.require_session().await?;
        let response: UnreadCountResponse = self
            .fetch_json(
                self.http
                    .get(self.endpoint("notifications/unread_count"))
                    .bearer_auth(session.token),
            )
            .await?;
        self.context.set_unread_count(response.unread).await;
        Ok(response.unread)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
