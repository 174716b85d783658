mod client;
mod hjks;
mod mastodon;
mod occto;
mod publisher;

pub use self::{
    hjks::{Api as Hjks, OutageInformation},
    mastodon::Api as Mastodon,
    occto::{Api as Occto, Measurement},
    publisher::{Poster, publish_thread},
};
