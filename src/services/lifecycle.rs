// SPDX-License-Identifier: MIT

//! Incident lifecycle engine.
//!
//! Enforces the state machine and authorization rules for creating,
//! accepting, cancelling and closing incidents:
//!
//! | Transition | Guard                                   | Effect                          |
//! |------------|-----------------------------------------|---------------------------------|
//! | create     | authenticated; title non-empty; finite  | new incident, OPEN              |
//! | accept     | OPEN; caller is a volunteer             | IN_PROGRESS, volunteer set, SMS |
//! | cancel     | IN_PROGRESS; caller is the volunteer    | OPEN, volunteer cleared         |
//! | close      | OPEN or IN_PROGRESS; caller is owner    | RESOLVED (terminal)             |
//!
//! Every transition is a single conditional write in the repository; two
//! racing accepts resolve to exactly one winner, and the loser sees a
//! `Conflict` rather than a silent failure.

use crate::db::incidents::NewIncident;
use crate::db::Db;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Incident, Role, Status};
use crate::services::sms::SmsNotifier;
use uuid::Uuid;

#[derive(Clone)]
pub struct LifecycleEngine {
    db: Db,
    notifier: SmsNotifier,
}

impl LifecycleEngine {
    pub fn new(db: Db, notifier: SmsNotifier) -> Self {
        Self { db, notifier }
    }

    /// Create a new OPEN incident owned by the caller.
    pub async fn create(&self, owner: &AuthUser, mut input: NewIncident) -> Result<Incident> {
        input.title = input.title.trim().to_string();
        if input.title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if !input.point.is_finite() {
            return Err(AppError::Validation(
                "Valid latitude and longitude are required".to_string(),
            ));
        }
        input.description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let incident = self.db.insert_incident(owner.id, &input).await?;

        tracing::info!(
            incident_id = %incident.id,
            owner_id = %owner.id,
            urgency = incident.urgency.as_str(),
            "Incident created"
        );

        Ok(incident)
    }

    /// Volunteer accepts an OPEN incident. At most one of any number of
    /// concurrent accepts succeeds; the losers get `Conflict`.
    pub async fn accept(&self, caller: &AuthUser, id: Uuid) -> Result<Incident> {
        if caller.role != Role::Volunteer {
            return Err(AppError::Forbidden(
                "Only volunteers can accept incidents".to_string(),
            ));
        }

        let updated = self
            .db
            .update_incident_status(
                id,
                &[Status::Open],
                Status::InProgress,
                Some(caller.id),
                None,
                None,
            )
            .await?;

        let Some(incident) = updated else {
            return Err(self.classify_accept_failure(id).await?);
        };

        tracing::info!(
            incident_id = %incident.id,
            volunteer_id = %caller.id,
            "Incident accepted"
        );

        self.spawn_accept_notification(&incident, caller.id);

        Ok(incident)
    }

    /// The assigned volunteer steps back; the incident reopens.
    pub async fn cancel(&self, caller: &AuthUser, id: Uuid) -> Result<Incident> {
        let updated = self
            .db
            .update_incident_status(
                id,
                &[Status::InProgress],
                Status::Open,
                None,
                Some(caller.id),
                None,
            )
            .await?;

        let Some(incident) = updated else {
            return Err(self.classify_guarded_failure(id, caller, Guard::Volunteer).await?);
        };

        tracing::info!(incident_id = %incident.id, volunteer_id = %caller.id, "Incident cancelled");

        Ok(incident)
    }

    /// The owning victim resolves the incident. RESOLVED is terminal.
    pub async fn close(&self, caller: &AuthUser, id: Uuid) -> Result<Incident> {
        let updated = self
            .db
            .update_incident_status(
                id,
                &[Status::Open, Status::InProgress],
                Status::Resolved,
                None,
                None,
                Some(caller.id),
            )
            .await?;

        let Some(incident) = updated else {
            return Err(self.classify_guarded_failure(id, caller, Guard::Owner).await?);
        };

        tracing::info!(incident_id = %incident.id, owner_id = %caller.id, "Incident resolved");

        Ok(incident)
    }

    /// Post-commit hook: best-effort SMS to the victim, off the request path.
    fn spawn_accept_notification(&self, incident: &Incident, volunteer_id: Uuid) {
        let db = self.db.clone();
        let notifier = self.notifier.clone();
        let victim_phone = incident.phone.clone();
        let incident_id = incident.id;

        tokio::spawn(async move {
            let volunteer = match db.get_user(volunteer_id).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    tracing::warn!(%volunteer_id, "Accepting volunteer not found; skipping SMS");
                    return;
                }
                Err(err) => {
                    tracing::warn!(%volunteer_id, error = %err, "Volunteer lookup failed; skipping SMS");
                    return;
                }
            };

            let name = volunteer.name.as_deref().unwrap_or("A volunteer");
            if volunteer.phone.is_none() {
                tracing::warn!(%incident_id, %volunteer_id, "Volunteer has no phone on file");
            }

            notifier
                .notify_accepted(&victim_phone, name, volunteer.phone.as_deref())
                .await;
        });
    }

    /// The accept's conditional write matched nothing: either the incident is
    /// gone, or it is no longer OPEN.
    async fn classify_accept_failure(&self, id: Uuid) -> Result<AppError> {
        let Some(brief) = self.db.get_incident_brief(id).await? else {
            return Ok(AppError::NotFound(format!("Incident {} not found", id)));
        };

        Ok(match brief.status() {
            Some(Status::Open) | None => {
                AppError::Conflict("Incident was just taken by another volunteer".to_string())
            }
            Some(Status::InProgress) => {
                AppError::Conflict("Incident is already being helped".to_string())
            }
            Some(Status::Resolved) => {
                AppError::Conflict("Incident has already been resolved".to_string())
            }
        })
    }

    async fn classify_guarded_failure(
        &self,
        id: Uuid,
        caller: &AuthUser,
        guard: Guard,
    ) -> Result<AppError> {
        let Some(brief) = self.db.get_incident_brief(id).await? else {
            return Ok(AppError::NotFound(format!("Incident {} not found", id)));
        };

        let entitled = match guard {
            Guard::Volunteer => brief.volunteer_id == Some(caller.id),
            Guard::Owner => brief.user_id == caller.id,
        };
        if !entitled {
            return Ok(AppError::Forbidden(match guard {
                Guard::Volunteer => "Only the assigned volunteer can cancel".to_string(),
                Guard::Owner => "Only the reporter can close this incident".to_string(),
            }));
        }

        Ok(match brief.status() {
            Some(Status::Resolved) => {
                AppError::Conflict("Incident has already been resolved".to_string())
            }
            _ => AppError::Conflict("Incident is not in a state allowing this change".to_string()),
        })
    }
}

#[derive(Clone, Copy)]
enum Guard {
    Volunteer,
    Owner,
}
