// SPDX-License-Identifier: MIT

//! Proximity feed: the paginated "nearby" list, map pins, and the caller's
//! own report/response history.
//!
//! The bulk read paths (nearby, pins) degrade to an empty result when the
//! underlying geospatial query fails: feed availability is preferred over
//! strict error signaling there. History views and everything that mutates
//! propagate errors normally.

use crate::db::incidents::{FeedCursor, MAX_PAGE_SIZE};
use crate::db::Db;
use crate::error::Result;
use crate::models::{FeedPage, GeoPoint, Incident, PinSummary, Status};
use uuid::Uuid;

/// Statuses shown in the nearby feed; resolved incidents drop out.
const FEED_STATUSES: [Status; 2] = [Status::Open, Status::InProgress];

#[derive(Clone)]
pub struct FeedService {
    db: Db,
}

impl FeedService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// One page of open/in-progress incidents within `radius_m` of `center`,
    /// ordered nearest-first with `(distance, id)` keyset pagination.
    ///
    /// Returns the page items (distances rounded to whole meters), an opaque
    /// cursor for the next page, and whether more rows exist.
    pub async fn nearby_feed(
        &self,
        center: GeoPoint,
        radius_m: f64,
        limit: i64,
        cursor: Option<FeedCursor>,
    ) -> FeedPage {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        // Fetch one extra row to learn whether another page exists.
        let result = self
            .db
            .find_incidents_within_radius(center, radius_m, &FEED_STATUSES, limit + 1, cursor)
            .await;

        let mut items = match result {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(error = %err, "Nearby query failed; serving empty feed");
                return FeedPage::empty();
            }
        };

        let has_more = items.len() > limit as usize;
        if has_more {
            items.truncate(limit as usize);
        }

        // Cursor must carry the exact distance PostGIS computed, so build it
        // before shaping the output.
        let next_cursor = if has_more {
            items.last().and_then(|incident| {
                incident.distance.map(|distance| {
                    crate::routes::incidents::encode_cursor(FeedCursor {
                        distance,
                        id: incident.id,
                    })
                })
            })
        } else {
            None
        };

        for incident in &mut items {
            incident.distance = incident.distance.map(f64::round);
        }

        FeedPage {
            data: items,
            next_cursor,
            has_more,
        }
    }

    /// Map-marker projection for every incident in radius. Same
    /// degrade-to-empty policy as the feed.
    pub async fn map_pins(&self, center: GeoPoint, radius_m: f64) -> Vec<PinSummary> {
        match self.db.map_pins(center, radius_m).await {
            Ok(pins) => pins,
            Err(err) => {
                tracing::warn!(error = %err, "Map pin query failed; serving empty set");
                vec![]
            }
        }
    }

    /// Incidents reported by the caller, newest first, distances annotated
    /// from their last known location.
    pub async fn my_reports(
        &self,
        owner_id: Uuid,
        caller_location: Option<GeoPoint>,
    ) -> Result<Vec<Incident>> {
        let mut items = self
            .db
            .find_incidents_by_owner(owner_id, caller_location)
            .await?;
        round_distances(&mut items);
        Ok(items)
    }

    /// Incidents the caller has responded to as a volunteer, newest first.
    pub async fn my_responses(
        &self,
        volunteer_id: Uuid,
        caller_location: Option<GeoPoint>,
    ) -> Result<Vec<Incident>> {
        let mut items = self
            .db
            .find_incidents_by_volunteer(volunteer_id, caller_location)
            .await?;
        round_distances(&mut items);
        Ok(items)
    }
}

fn round_distances(items: &mut [Incident]) {
    for incident in items {
        incident.distance = incident.distance.map(f64::round);
    }
}
