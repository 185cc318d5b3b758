//! Home feed command.

use clap::Args;
use serde_json::Value;

use folio_types::FeedMode;

use crate::Services;

#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Member id; 0 for an anonymous visitor.
    #[arg(long, default_value_t = 0)]
    pub member: i64,
    /// 1-based page index.
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Page size; defaults to the configured feed page size.
    #[arg(long)]
    pub page_size: Option<u32>,
    /// "grouped" or "ranked_merge"; defaults to the configured mode.
    #[arg(long)]
    pub mode: Option<FeedMode>,
}

pub fn run(services: &Services, args: FeedArgs) -> anyhow::Result<Value> {
    let page_size = args.page_size.unwrap_or(services.config.feed.page_size);
    let mode = args.mode.unwrap_or(services.feed.options().mode);
    let feed = services
        .feed
        .build_feed_with_mode(args.member, args.page, page_size, mode)?;
    let total_pages = feed.total_pages();

    let mut value = serde_json::to_value(&feed)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("total_pages".to_string(), total_pages.into());
    }
    Ok(value)
}
