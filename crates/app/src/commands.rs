use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use services::{AppServices, PageView, ReaderError};
use spoken_core::model::{CategoryId, ContentId, ContentItem, PageNumber};
use spoken_core::pagination::PageLink;
use spoken_core::scroller::SentenceScroller;

use crate::args::Command;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug)]
pub enum CommandError {
    ItemNotFound {
        category: CategoryId,
        id: ContentId,
        page: PageNumber,
    },
    Interrupted,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::ItemNotFound { category, id, page } => {
                write!(f, "no item {id} on page {page} of {category}")
            }
            CommandError::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl std::error::Error for CommandError {}

pub async fn execute(services: &AppServices, command: Command) -> CommandResult {
    match command {
        Command::Categories => {
            list_categories(services);
            Ok(())
        }
        Command::Read { category, page } => {
            let reader = services.open_reader(&category, page).await?;
            print_view(reader.category().display_name(), reader.view());
            Ok(())
        }
        Command::Next { category } => {
            let mut reader = services.open_reader(&category, None).await?;
            let name = reader.category().display_name().to_owned();
            print_view(&name, reader.next().await);
            Ok(())
        }
        Command::Prev { category } => {
            let mut reader = services.open_reader(&category, None).await?;
            let name = reader.category().display_name().to_owned();
            print_view(&name, reader.previous().await);
            Ok(())
        }
        Command::Pages { category, .. } => pages(services, &category).await,
        Command::Mark { category, id } => mark(services, &category, id).await,
        Command::Marked { category } => {
            marked(services, category.as_ref()).await;
            Ok(())
        }
        Command::Scroll {
            category,
            id,
            page,
            speed,
        } => scroll(services, &category, id, page, speed).await,
        Command::Reset => {
            services.progress().clear().await;
            println!("progress cleared");
            Ok(())
        }
    }
}

fn resolve_category(services: &AppServices, raw: &str) -> Result<CategoryId, ReaderError> {
    let id = CategoryId::new(raw)?;
    if services.registry().get(&id).is_none() {
        return Err(ReaderError::UnknownCategory(raw.to_owned()));
    }
    Ok(id)
}

fn list_categories(services: &AppServices) {
    for category in services.registry().all() {
        println!(
            "{} {:<16} {:<16} {}",
            category.icon(),
            category.id(),
            category.display_name(),
            category.description()
        );
    }
}

fn print_view(name: &str, view: &PageView) {
    println!("{name} - page {}", view.page);
    if view.items.is_empty() {
        println!("  (no content)");
    }
    for item in &view.items {
        let mark = if view.is_marked(item.id()) { "*" } else { " " };
        match item.preview() {
            Some(preview) => println!("  [{mark}] {:>4}  {}  ({preview})", item.id(), item.title()),
            None => println!("  [{mark}] {:>4}  {}", item.id(), item.title()),
        }
    }
    let links = view.links();
    if !links.is_empty() {
        println!("{}", render_links(view, &links));
    }
}

fn render_links(view: &PageView, links: &[PageLink]) -> String {
    let mut parts = Vec::with_capacity(links.len() + 2);
    if view.has_previous() {
        parts.push("<".to_owned());
    }
    parts.extend(links.iter().map(|link| match link {
        PageLink::Page(page) => page.to_string(),
        PageLink::Current(page) => format!("[{page}]"),
        PageLink::Gap => "...".to_owned(),
    }));
    if view.has_next() {
        parts.push(">".to_owned());
    }
    parts.join(" ")
}

/// Discover the pages of a category. Ctrl-C cancels the probe.
async fn pages(services: &AppServices, raw: &str) -> CommandResult {
    let category = resolve_category(services, raw)?;
    let loader = services.loader();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });
    let found = loader
        .discover_available_pages_with_cancel(&category, &cancel)
        .await;
    signal.abort();

    let Some(found) = found else {
        warn!(%category, "page discovery cancelled");
        return Err(CommandError::Interrupted.into());
    };
    info!(%category, strategy = ?loader.config().strategy, pages = found.len(), "discovered pages");
    let pages: Vec<String> = found.iter().map(ToString::to_string).collect();
    println!("{category}: {} page(s) [{}]", found.len(), pages.join(", "));
    Ok(())
}

async fn mark(services: &AppServices, raw: &str, id: ContentId) -> CommandResult {
    let category = resolve_category(services, raw)?;
    let marked = services.progress().toggle_marked(&category, id).await;
    if marked {
        println!("marked {category}/{id}");
    } else {
        println!("unmarked {category}/{id}");
    }
    Ok(())
}

async fn marked(services: &AppServices, category: Option<&CategoryId>) {
    let resolved = services.marked().resolve(category).await;
    if resolved.is_empty() {
        println!("no marked items");
        return;
    }
    for entry in resolved {
        let when = entry.marked.timestamp.format("%Y-%m-%d %H:%M");
        println!(
            "{when}  {:<16} {:>4}  {}",
            entry.marked.category,
            entry.item.id(),
            entry.item.title()
        );
    }
}

/// Lines the scroller shows for an item; short items show title then gloss.
fn scroll_lines(item: &ContentItem) -> Vec<String> {
    item.scroll_lines().unwrap_or_else(|| {
        std::iter::once(item.title())
            .chain(item.preview())
            .map(str::to_owned)
            .collect()
    })
}

async fn scroll(
    services: &AppServices,
    raw: &str,
    id: ContentId,
    page: Option<PageNumber>,
    speed: Option<f32>,
) -> CommandResult {
    let category = resolve_category(services, raw)?;
    let page = match page {
        Some(page) => page,
        None => services.progress().get_last_visited_page(&category).await,
    };
    let item = services
        .loader()
        .fetch_page(&category, page)
        .await
        .into_iter()
        .find(|item| item.id() == id)
        .ok_or(CommandError::ItemNotFound { category, id, page })?;

    let mut scroller = SentenceScroller::new(scroll_lines(&item))?;
    if let Some(speed) = speed {
        scroller.set_speed(speed);
    }
    scroller.toggle_auto();
    println!("{} ({:.1}x)", item.title(), scroller.speed());

    let mut ticker = tokio::time::interval(scroller.interval());
    for _ in 0..scroller.len() {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => return Err(CommandError::Interrupted.into()),
        }
        println!(
            "  {:>3.0}%  {}",
            scroller.progress() * 100.0,
            scroller.current()
        );
        scroller.tick();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoken_core::model::{Phrase, Speech};

    #[test]
    fn short_items_scroll_title_then_gloss() {
        let item = ContentItem::Phrase(Phrase {
            id: ContentId::new(1),
            phrase: "hit the sack".into(),
            meaning: "go to bed".into(),
        });
        assert_eq!(scroll_lines(&item), vec!["hit the sack", "go to bed"]);

        let speech = ContentItem::Speech(Speech {
            id: ContentId::new(2),
            title: "Toast".into(),
            content: vec!["Thank you all.".into()],
        });
        assert_eq!(scroll_lines(&speech), vec!["Thank you all."]);
    }
}
