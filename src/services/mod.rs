// SPDX-License-Identifier: MIT

//! Business services: lifecycle engine, proximity feed, and external
//! collaborators (SMS gateway, media store, identity provider).

pub mod feed;
pub mod google;
pub mod lifecycle;
pub mod media;
pub mod sms;

pub use feed::FeedService;
pub use google::GoogleOAuth;
pub use lifecycle::LifecycleEngine;
pub use media::MediaService;
pub use sms::SmsNotifier;
