// SPDX-License-Identifier: MIT

//! Incident persistence and geospatial queries.
//!
//! Distances are computed by PostGIS on the `geography` type, so every
//! distance in this module is great-circle meters. The nearby query is
//! keyset-paginated on `(distance, id)`: the `id` tiebreak makes the order
//! total, so walking pages under concurrent inserts never duplicates or
//! skips rows the way offset pagination does.

use crate::db::Db;
use crate::error::AppError;
use crate::models::{GeoPoint, Incident, PinSummary, PublicProfile, Status, Urgency};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Hard cap on feed page size, regardless of the requested limit.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Keyset cursor: the `(distance, id)` sort key of the last row of the
/// previous page. The next page selects strictly-greater tuples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedCursor {
    /// Exact distance in meters as computed by PostGIS for the boundary row.
    pub distance: f64,
    pub id: Uuid,
}

/// Input for creating an incident. Validated by the lifecycle engine before
/// it reaches this layer.
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub title: String,
    pub description: Option<String>,
    pub point: GeoPoint,
    pub media: Vec<String>,
    pub urgency: Urgency,
    pub phone: String,
}

/// Minimal row used to classify a failed conditional update.
#[derive(Debug, sqlx::FromRow)]
pub struct IncidentBrief {
    pub status: String,
    pub user_id: Uuid,
    pub volunteer_id: Option<Uuid>,
}

impl IncidentBrief {
    pub fn status(&self) -> Option<Status> {
        Status::parse(&self.status)
    }
}

/// Full row shape shared by every incident query: entity columns, decomposed
/// coordinates, optional distance, and the joined owner/volunteer profiles.
#[derive(Debug, sqlx::FromRow)]
struct IncidentRecord {
    id: Uuid,
    title: String,
    description: Option<String>,
    lat: f64,
    lng: f64,
    media: Vec<String>,
    urgency: String,
    phone: String,
    status: String,
    user_id: Uuid,
    volunteer_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    distance: Option<f64>,
    owner_name: Option<String>,
    owner_image: Option<String>,
    owner_phone: Option<String>,
    volunteer_name: Option<String>,
    volunteer_image: Option<String>,
    volunteer_phone: Option<String>,
}

impl IncidentRecord {
    fn into_incident(self) -> Result<Incident, AppError> {
        let status = Status::parse(&self.status)
            .ok_or_else(|| AppError::Database(format!("Unknown status: {}", self.status)))?;
        let urgency = Urgency::parse_lenient(&self.urgency);

        let user = Some(PublicProfile {
            id: self.user_id,
            name: self.owner_name,
            image: self.owner_image,
            phone: self.owner_phone,
        });
        let volunteer = self.volunteer_id.map(|id| PublicProfile {
            id,
            name: self.volunteer_name,
            image: self.volunteer_image,
            phone: self.volunteer_phone,
        });

        Ok(Incident {
            id: self.id,
            title: self.title,
            description: self.description,
            lat: self.lat,
            lng: self.lng,
            media: self.media,
            urgency,
            phone: self.phone,
            status,
            user_id: self.user_id,
            volunteer_id: self.volunteer_id,
            created_at: self.created_at,
            distance: self.distance,
            user,
            volunteer,
        })
    }
}

fn into_incidents(records: Vec<IncidentRecord>) -> Result<Vec<Incident>, AppError> {
    records
        .into_iter()
        .map(IncidentRecord::into_incident)
        .collect()
}

impl Db {
    /// Insert a new incident with status OPEN and return the full row
    /// including the owner's public profile.
    pub async fn insert_incident(
        &self,
        owner_id: Uuid,
        input: &NewIncident,
    ) -> Result<Incident, AppError> {
        let record = sqlx::query_as::<_, IncidentRecord>(
            r#"
            WITH inserted AS (
                INSERT INTO incidents
                    (id, title, description, location, media, urgency, phone, status, user_id)
                VALUES
                    ($1, $2, $3,
                     ST_SetSRID(ST_MakePoint($4, $5), 4326)::geography,
                     $6, $7, $8, 'OPEN', $9)
                RETURNING *
            )
            SELECT i.id, i.title, i.description,
                   ST_Y(i.location::geometry) AS lat,
                   ST_X(i.location::geometry) AS lng,
                   i.media, i.urgency, i.phone, i.status,
                   i.user_id, i.volunteer_id, i.created_at,
                   NULL::float8 AS distance,
                   u.name AS owner_name, u.image AS owner_image, u.phone AS owner_phone,
                   NULL::text AS volunteer_name, NULL::text AS volunteer_image,
                   NULL::text AS volunteer_phone
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.title)
        .bind(input.description.as_deref())
        .bind(input.point.lng)
        .bind(input.point.lat)
        .bind(&input.media)
        .bind(input.urgency.as_str())
        .bind(&input.phone)
        .bind(owner_id)
        .fetch_one(self.pool()?)
        .await?;

        record.into_incident()
    }

    /// Incidents within `radius_m` meters of `center` whose status is in
    /// `statuses`, ordered by `(distance ASC, id ASC)`.
    ///
    /// With a cursor, only rows strictly after the cursor's sort key are
    /// returned. `limit` is capped at [`MAX_PAGE_SIZE`] by the feed service;
    /// callers may pass limit+1 to detect whether more pages exist.
    pub async fn find_incidents_within_radius(
        &self,
        center: GeoPoint,
        radius_m: f64,
        statuses: &[Status],
        limit: i64,
        cursor: Option<FeedCursor>,
    ) -> Result<Vec<Incident>, AppError> {
        let status_names: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let records = sqlx::query_as::<_, IncidentRecord>(
            r#"
            SELECT * FROM (
                SELECT i.id, i.title, i.description,
                       ST_Y(i.location::geometry) AS lat,
                       ST_X(i.location::geometry) AS lng,
                       i.media, i.urgency, i.phone, i.status,
                       i.user_id, i.volunteer_id, i.created_at,
                       ST_Distance(i.location,
                                   ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography)
                           AS distance,
                       u.name AS owner_name, u.image AS owner_image, u.phone AS owner_phone,
                       v.name AS volunteer_name, v.image AS volunteer_image,
                       v.phone AS volunteer_phone
                FROM incidents i
                JOIN users u ON u.id = i.user_id
                LEFT JOIN users v ON v.id = i.volunteer_id
                WHERE ST_DWithin(i.location,
                                 ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                                 $3)
                  AND i.status = ANY($4)
            ) nearby
            WHERE $5::float8 IS NULL
               OR (nearby.distance, nearby.id) > ($5::float8, $6::uuid)
            ORDER BY nearby.distance ASC, nearby.id ASC
            LIMIT $7
            "#,
        )
        .bind(center.lng)
        .bind(center.lat)
        .bind(radius_m)
        .bind(&status_names)
        .bind(cursor.map(|c| c.distance))
        .bind(cursor.map(|c| c.id))
        .bind(limit)
        .fetch_all(self.pool()?)
        .await?;

        into_incidents(records)
    }

    /// Lightweight projection for map markers: every incident in radius,
    /// no joins, no limit.
    pub async fn map_pins(
        &self,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<PinSummary>, AppError> {
        let pins = sqlx::query_as::<_, PinSummary>(
            r#"
            SELECT i.id, i.urgency, i.status,
                   ST_Y(i.location::geometry) AS lat,
                   ST_X(i.location::geometry) AS lng
            FROM incidents i
            WHERE ST_DWithin(i.location,
                             ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                             $3)
            "#,
        )
        .bind(center.lng)
        .bind(center.lat)
        .bind(radius_m)
        .fetch_all(self.pool()?)
        .await?;

        Ok(pins)
    }

    /// Find an incident by id with owner and volunteer profiles. When the
    /// caller's location is known, the row is annotated with the distance
    /// from it.
    pub async fn find_incident_by_id(
        &self,
        id: Uuid,
        caller_location: Option<GeoPoint>,
    ) -> Result<Option<Incident>, AppError> {
        let record = sqlx::query_as::<_, IncidentRecord>(
            r#"
            SELECT i.id, i.title, i.description,
                   ST_Y(i.location::geometry) AS lat,
                   ST_X(i.location::geometry) AS lng,
                   i.media, i.urgency, i.phone, i.status,
                   i.user_id, i.volunteer_id, i.created_at,
                   CASE WHEN $2::float8 IS NULL THEN NULL
                        ELSE ST_Distance(i.location,
                                         ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography)
                   END AS distance,
                   u.name AS owner_name, u.image AS owner_image, u.phone AS owner_phone,
                   v.name AS volunteer_name, v.image AS volunteer_image,
                   v.phone AS volunteer_phone
            FROM incidents i
            JOIN users u ON u.id = i.user_id
            LEFT JOIN users v ON v.id = i.volunteer_id
            WHERE i.id = $1
            "#,
        )
        .bind(id)
        .bind(caller_location.map(|p| p.lng))
        .bind(caller_location.map(|p| p.lat))
        .fetch_optional(self.pool()?)
        .await?;

        record.map(IncidentRecord::into_incident).transpose()
    }

    /// All incidents reported by a user, newest first.
    pub async fn find_incidents_by_owner(
        &self,
        owner_id: Uuid,
        caller_location: Option<GeoPoint>,
    ) -> Result<Vec<Incident>, AppError> {
        self.find_incidents_scoped("i.user_id = $1", owner_id, caller_location)
            .await
    }

    /// All incidents a volunteer has responded to, newest first.
    pub async fn find_incidents_by_volunteer(
        &self,
        volunteer_id: Uuid,
        caller_location: Option<GeoPoint>,
    ) -> Result<Vec<Incident>, AppError> {
        self.find_incidents_scoped("i.volunteer_id = $1", volunteer_id, caller_location)
            .await
    }

    async fn find_incidents_scoped(
        &self,
        filter: &str,
        scope_id: Uuid,
        caller_location: Option<GeoPoint>,
    ) -> Result<Vec<Incident>, AppError> {
        // `filter` is one of two fixed fragments above, never caller input.
        let sql = format!(
            r#"
            SELECT i.id, i.title, i.description,
                   ST_Y(i.location::geometry) AS lat,
                   ST_X(i.location::geometry) AS lng,
                   i.media, i.urgency, i.phone, i.status,
                   i.user_id, i.volunteer_id, i.created_at,
                   CASE WHEN $2::float8 IS NULL THEN NULL
                        ELSE ST_Distance(i.location,
                                         ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography)
                   END AS distance,
                   u.name AS owner_name, u.image AS owner_image, u.phone AS owner_phone,
                   v.name AS volunteer_name, v.image AS volunteer_image,
                   v.phone AS volunteer_phone
            FROM incidents i
            JOIN users u ON u.id = i.user_id
            LEFT JOIN users v ON v.id = i.volunteer_id
            WHERE {filter}
            ORDER BY i.created_at DESC
            "#
        );

        let records = sqlx::query_as::<_, IncidentRecord>(&sql)
            .bind(scope_id)
            .bind(caller_location.map(|p| p.lng))
            .bind(caller_location.map(|p| p.lat))
            .fetch_all(self.pool()?)
            .await?;

        into_incidents(records)
    }

    /// Conditionally transition an incident's status.
    ///
    /// The current status (and, when given, the owner/volunteer guards) are
    /// re-checked atomically with the write, so two racing accepts cannot
    /// both succeed. Returns `None` when any precondition failed; the caller
    /// classifies the failure with [`Db::get_incident_brief`].
    pub async fn update_incident_status(
        &self,
        id: Uuid,
        expected: &[Status],
        new_status: Status,
        new_volunteer: Option<Uuid>,
        required_volunteer: Option<Uuid>,
        required_owner: Option<Uuid>,
    ) -> Result<Option<Incident>, AppError> {
        let expected_names: Vec<String> = expected.iter().map(|s| s.as_str().to_string()).collect();

        let record = sqlx::query_as::<_, IncidentRecord>(
            r#"
            WITH updated AS (
                UPDATE incidents
                SET status = $2, volunteer_id = $3
                WHERE id = $1
                  AND status = ANY($4)
                  AND ($5::uuid IS NULL OR volunteer_id = $5)
                  AND ($6::uuid IS NULL OR user_id = $6)
                RETURNING *
            )
            SELECT i.id, i.title, i.description,
                   ST_Y(i.location::geometry) AS lat,
                   ST_X(i.location::geometry) AS lng,
                   i.media, i.urgency, i.phone, i.status,
                   i.user_id, i.volunteer_id, i.created_at,
                   NULL::float8 AS distance,
                   u.name AS owner_name, u.image AS owner_image, u.phone AS owner_phone,
                   v.name AS volunteer_name, v.image AS volunteer_image,
                   v.phone AS volunteer_phone
            FROM updated i
            JOIN users u ON u.id = i.user_id
            LEFT JOIN users v ON v.id = i.volunteer_id
            "#,
        )
        .bind(id)
        .bind(new_status.as_str())
        .bind(new_volunteer)
        .bind(&expected_names)
        .bind(required_volunteer)
        .bind(required_owner)
        .fetch_optional(self.pool()?)
        .await?;

        record.map(IncidentRecord::into_incident).transpose()
    }

    /// Status and ownership of an incident, for classifying a failed
    /// conditional update. Advisory only; correctness rests on the atomic
    /// write above.
    pub async fn get_incident_brief(&self, id: Uuid) -> Result<Option<IncidentBrief>, AppError> {
        let brief = sqlx::query_as::<_, IncidentBrief>(
            "SELECT status, user_id, volunteer_id FROM incidents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(brief)
    }
}
