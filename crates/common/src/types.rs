use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Types of claim-workflow notifications the endpoint can render.
///
/// The `Consolidated*` variants cover bulk emails that roll several claims of
/// one employee into a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    // Per-claim notifications
    Submission,
    EmployeeSubmissionConfirmation,
    AdminVerification,
    EmployeeVerification,
    ManagerApproval,
    EmployeeApproval,
    Rejection,
    Processed,
    AdminRejectionNotice,
    ManagerRejectionNotice,
    AccountingRejectionNotice,

    // Consolidated (multi-claim) notifications
    ConsolidatedSubmission,
    ConsolidatedEmployeeSubmissionConfirmation,
    ConsolidatedAdminVerification,
    ConsolidatedEmployeeVerification,
    ConsolidatedManagerApproval,
    ConsolidatedEmployeeApproval,
    ConsolidatedRejection,
    ConsolidatedProcessed,
}

impl NotificationType {
    /// Whether this type carries multiple claims in one message.
    pub fn is_consolidated(&self) -> bool {
        matches!(
            self,
            NotificationType::ConsolidatedSubmission
                | NotificationType::ConsolidatedEmployeeSubmissionConfirmation
                | NotificationType::ConsolidatedAdminVerification
                | NotificationType::ConsolidatedEmployeeVerification
                | NotificationType::ConsolidatedManagerApproval
                | NotificationType::ConsolidatedEmployeeApproval
                | NotificationType::ConsolidatedRejection
                | NotificationType::ConsolidatedProcessed
        )
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            NotificationType::Submission => "submission",
            NotificationType::EmployeeSubmissionConfirmation => {
                "employee_submission_confirmation"
            }
            NotificationType::AdminVerification => "admin_verification",
            NotificationType::EmployeeVerification => "employee_verification",
            NotificationType::ManagerApproval => "manager_approval",
            NotificationType::EmployeeApproval => "employee_approval",
            NotificationType::Rejection => "rejection",
            NotificationType::Processed => "processed",
            NotificationType::AdminRejectionNotice => "admin_rejection_notice",
            NotificationType::ManagerRejectionNotice => "manager_rejection_notice",
            NotificationType::AccountingRejectionNotice => "accounting_rejection_notice",
            NotificationType::ConsolidatedSubmission => "consolidated_submission",
            NotificationType::ConsolidatedEmployeeSubmissionConfirmation => {
                "consolidated_employee_submission_confirmation"
            }
            NotificationType::ConsolidatedAdminVerification => "consolidated_admin_verification",
            NotificationType::ConsolidatedEmployeeVerification => {
                "consolidated_employee_verification"
            }
            NotificationType::ConsolidatedManagerApproval => "consolidated_manager_approval",
            NotificationType::ConsolidatedEmployeeApproval => "consolidated_employee_approval",
            NotificationType::ConsolidatedRejection => "consolidated_rejection",
            NotificationType::ConsolidatedProcessed => "consolidated_processed",
        };
        write!(f, "{}", tag)
    }
}

/// Email delivery status recorded per recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A notification recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

impl Recipient {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// The claim fields the endpoint echoes into email templates.
///
/// Unlike the request envelope, these keep their snake_case store-column
/// names on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDetails {
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_number: Option<String>,
    pub category_name: String,
    pub subcategory_name: String,
}

/// JSON body posted to the notification endpoint.
///
/// The endpoint is an external collaborator with a camelCase wire contract;
/// it renders the subject line from `notification_type`, hands the message to
/// the email provider, and persists one delivery record per claim id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub recipient_email: String,
    pub recipient_name: String,
    pub notification_type: NotificationType,

    /// Single-claim notifications carry one claim id plus its details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_details: Option<ClaimDetails>,

    /// Consolidated notifications carry the full id list and details of every
    /// rolled-up claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims_details: Option<Vec<ClaimDetails>>,

    /// Pre-rendered HTML message body. Required for consolidated types; the
    /// endpoint can render single-claim bodies itself from `claim_details`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejector_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
}

impl NotificationRequest {
    /// Build a single-claim notification.
    pub fn single(
        recipient: &Recipient,
        notification_type: NotificationType,
        claim: ClaimDetails,
    ) -> Self {
        Self {
            recipient_email: recipient.email.clone(),
            recipient_name: recipient.name.clone(),
            notification_type,
            claim_id: Some(claim.id),
            claim_details: Some(claim),
            claim_ids: None,
            claims_details: None,
            html_content: None,
            employee_name: None,
            rejected_by: None,
            rejector_name: None,
            rejection_reason: None,
            total_amount: None,
        }
    }

    /// Build a consolidated (multi-claim) notification.
    ///
    /// Claim ids and the total amount are derived from `claims`.
    pub fn consolidated(
        recipient: &Recipient,
        notification_type: NotificationType,
        claims: Vec<ClaimDetails>,
        html_content: impl Into<String>,
    ) -> Self {
        let claim_ids: Vec<Uuid> = claims.iter().map(|c| c.id).collect();
        let total_amount: f64 = claims.iter().map(|c| c.amount).sum();
        Self {
            recipient_email: recipient.email.clone(),
            recipient_name: recipient.name.clone(),
            notification_type,
            claim_id: None,
            claim_details: None,
            claim_ids: Some(claim_ids),
            claims_details: Some(claims),
            html_content: Some(html_content.into()),
            employee_name: None,
            rejected_by: None,
            rejector_name: None,
            rejection_reason: None,
            total_amount: Some(total_amount),
        }
    }

    /// Attach the submitting employee's display name.
    pub fn with_employee_name(mut self, name: impl Into<String>) -> Self {
        self.employee_name = Some(name.into());
        self
    }

    /// Attach a pre-rendered HTML body.
    pub fn with_html_content(mut self, html: impl Into<String>) -> Self {
        self.html_content = Some(html.into());
        self
    }

    /// Attach rejection metadata (who rejected and why).
    pub fn with_rejection(
        mut self,
        rejected_by: Uuid,
        rejector_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.rejected_by = Some(rejected_by);
        self.rejector_name = Some(rejector_name.into());
        self.rejection_reason = Some(reason.into());
        self
    }

    /// Apply the endpoint's admission rules before a request is queued.
    ///
    /// Mirrors the endpoint's own 400 responses so a malformed request never
    /// consumes a rate-limited send slot.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.recipient_email.trim().is_empty() || !self.recipient_email.contains('@') {
            return Err(AppError::Validation(format!(
                "invalid recipient email: {:?}",
                self.recipient_email
            )));
        }

        if self.notification_type.is_consolidated() {
            if self.claim_ids.as_ref().is_none_or(|ids| ids.is_empty()) {
                return Err(AppError::Validation(
                    "consolidated notification requires at least one claim id".to_string(),
                ));
            }
            if self.html_content.is_none() {
                return Err(AppError::Validation(
                    "consolidated notification requires rendered html content".to_string(),
                ));
            }
        } else if self.claim_id.is_none() || self.claim_details.is_none() {
            return Err(AppError::Validation(
                "single-claim notification requires claim id and details".to_string(),
            ));
        }

        Ok(())
    }
}

/// Reply from the notification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub success: bool,
    /// Message id assigned by the email provider, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Terminal outcome of one dispatched send, as observed by the caller.
///
/// Batch callers collect these to present a partial-success summary instead
/// of failing a whole batch over one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailOutcome {
    pub recipient_email: String,
    pub notification_type: NotificationType,
    pub status: DeliveryStatus,
    pub message_id: Option<String>,
    pub error: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl EmailOutcome {
    /// Record a delivered send.
    pub fn sent(
        recipient_email: impl Into<String>,
        notification_type: NotificationType,
        message_id: Option<String>,
    ) -> Self {
        Self {
            recipient_email: recipient_email.into(),
            notification_type,
            status: DeliveryStatus::Sent,
            message_id,
            error: None,
            sent_at: Utc::now(),
        }
    }

    /// Record a terminally failed send.
    pub fn failed(
        recipient_email: impl Into<String>,
        notification_type: NotificationType,
        error: impl Into<String>,
    ) -> Self {
        Self {
            recipient_email: recipient_email.into(),
            notification_type,
            status: DeliveryStatus::Failed,
            message_id: None,
            error: Some(error.into()),
            sent_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_recipient() -> Recipient {
        Recipient::new("employee@example.com", "Jordan Lee")
    }

    fn make_claim(amount: f64) -> ClaimDetails {
        ClaimDetails {
            id: Uuid::new_v4(),
            description: "Site visit mileage".to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            job_number: Some("J-1042".to_string()),
            category_name: "Travel".to_string(),
            subcategory_name: "Mileage".to_string(),
        }
    }

    #[test]
    fn test_notification_type_wire_tags() {
        assert_eq!(NotificationType::Submission.to_string(), "submission");
        assert_eq!(
            NotificationType::AccountingRejectionNotice.to_string(),
            "accounting_rejection_notice"
        );
        assert_eq!(
            NotificationType::ConsolidatedManagerApproval.to_string(),
            "consolidated_manager_approval"
        );

        // Display and serde must agree on the tag
        let json = serde_json::to_value(NotificationType::ConsolidatedSubmission).unwrap();
        assert_eq!(json, serde_json::json!("consolidated_submission"));
    }

    #[test]
    fn test_consolidated_classification() {
        assert!(NotificationType::ConsolidatedRejection.is_consolidated());
        assert!(!NotificationType::Rejection.is_consolidated());
        assert!(!NotificationType::EmployeeSubmissionConfirmation.is_consolidated());
    }

    #[test]
    fn test_single_request_wire_shape() {
        let claim = make_claim(125.50);
        let claim_id = claim.id;
        let request = NotificationRequest::single(
            &make_recipient(),
            NotificationType::Submission,
            claim,
        )
        .with_employee_name("Jordan Lee");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["recipientEmail"], "employee@example.com");
        assert_eq!(json["notificationType"], "submission");
        assert_eq!(json["claimId"], serde_json::json!(claim_id));
        assert_eq!(json["employeeName"], "Jordan Lee");
        // Absent optionals are omitted, not null
        assert!(json.get("claimIds").is_none());
        assert!(json.get("rejectionReason").is_none());
    }

    #[test]
    fn test_consolidated_request_derives_ids_and_total() {
        let claims = vec![make_claim(100.0), make_claim(40.25), make_claim(9.75)];
        let request = NotificationRequest::consolidated(
            &make_recipient(),
            NotificationType::ConsolidatedSubmission,
            claims,
            "<p>3 claims submitted</p>",
        );

        assert_eq!(request.claim_ids.as_ref().unwrap().len(), 3);
        assert_eq!(request.total_amount, Some(150.0));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_recipient() {
        let mut request = NotificationRequest::single(
            &make_recipient(),
            NotificationType::Rejection,
            make_claim(10.0),
        );
        request.recipient_email = "not-an-email".to_string();
        assert!(matches!(
            request.validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_consolidated_without_html() {
        let mut request = NotificationRequest::consolidated(
            &make_recipient(),
            NotificationType::ConsolidatedProcessed,
            vec![make_claim(10.0)],
            "<p>processed</p>",
        );
        request.html_content = None;
        assert!(request.validate().is_err());

        request.html_content = Some("<p>processed</p>".to_string());
        request.claim_ids = Some(vec![]);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_single_without_claim() {
        let mut request = NotificationRequest::single(
            &make_recipient(),
            NotificationType::ManagerApproval,
            make_claim(10.0),
        );
        request.claim_details = None;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_rejection_metadata_round_trip() {
        let rejector = Uuid::new_v4();
        let request = NotificationRequest::single(
            &make_recipient(),
            NotificationType::Rejection,
            make_claim(75.0),
        )
        .with_rejection(rejector, "Casey Admin", "Receipt is illegible");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["rejectorName"], "Casey Admin");
        assert_eq!(json["rejectionReason"], "Receipt is illegible");

        let parsed: NotificationRequest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.rejected_by, Some(rejector));
    }

    #[test]
    fn test_email_outcome_constructors() {
        let sent = EmailOutcome::sent(
            "a@example.com",
            NotificationType::Processed,
            Some("msg_123".to_string()),
        );
        assert_eq!(sent.status, DeliveryStatus::Sent);
        assert!(sent.error.is_none());

        let failed = EmailOutcome::failed(
            "b@example.com",
            NotificationType::Processed,
            "connection refused",
        );
        assert_eq!(failed.status, DeliveryStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
        assert!(failed.message_id.is_none());
    }
}
