use assert_fs::prelude::*;
use assert_fs::TempDir;
use loadout::catalog::{fetch_detail, FsSource, LoaderContext, SearchFilters};
use loadout::render::{render_cards, RenderService};
use loadout::services::{Collection, GameStatus, IndexBuilder, TouchOutcome, TouchService};
use loadout::testing::{index_slugs, read_index};
use predicates::prelude::*;

fn seed_site(site: &TempDir) {
    site.child("content/games/poe.json")
        .write_str(r#"{"name": "Path of Exile", "status": "active", "cover": "img/poe.jpg", "publisher": "GGG"}"#)
        .unwrap();
    site.child("content/games/d3.json")
        .write_str(r#"{"name": "Diablo III", "status": "Archivé"}"#)
        .unwrap();

    site.child("content/builds/necro.json")
        .write_str(r#"{"title": "Bone Necro", "tier": "S", "version": "3.25", "updatedAt": "2025-02-01", "gameName": "content/games/poe.json", "tags": ["minion"]}"#)
        .unwrap();
    site.child("content/builds/witch.json")
        .write_str(r#"{"title": "Frost Witch", "tier": "A", "version": "3.24", "updatedAt": "2025-03-01", "game": "poe"}"#)
        .unwrap();
    site.child("content/builds/barb.json")
        .write_str(r#"{"title": "Whirlwind Barb", "tier": "S", "updatedAt": "2024-06-01", "gameName": "d3"}"#)
        .unwrap();
    site.child("content/builds/broken.json")
        .write_str("{ not json")
        .unwrap();

    site.child("content/guides/act-1.json")
        .write_str(r#"{"title": "Act 1", "resource": "Gold", "date": "2025-01-10", "gameName": "poe"}"#)
        .unwrap();
    site.child("content/tools/planner.json")
        .write_str(r#"{"title": "Passive Planner", "kind": "web", "url": "https://example.com", "gameName": "ghost"}"#)
        .unwrap();
}

#[tokio::test]
async fn build_all_writes_every_index() {
    let site = TempDir::new().unwrap();
    seed_site(&site);
    let content = site.path().join("content");

    let report = IndexBuilder::new(&content).build_all().await.unwrap();

    assert_eq!(report.collections.len(), 4);
    assert_eq!(report.total_items(), 2 + 4 + 1 + 1);
    assert_eq!(report.total_defaulted(), 1);

    site.child("content/builds/index.json")
        .assert(predicate::path::exists())
        .assert(predicate::str::ends_with("}\n"));
    assert_eq!(index_slugs(&content, "games"), vec!["d3", "poe"]);
    assert_eq!(
        index_slugs(&content, "builds"),
        vec!["witch", "necro", "barb", "broken"]
    );

    let builds = read_index(&content, "builds");
    let necro = &builds["items"][1];
    assert_eq!(necro["gameName"], "poe");
    assert_eq!(necro["gameDisplayName"], "Path of Exile");
    assert_eq!(necro["gameStatus"], "active");
    assert_eq!(necro["tags"][0], "minion");
    assert_eq!(builds["items"][2]["gameStatus"], "archived");

    let tools = read_index(&content, "tools");
    assert_eq!(tools["items"][0]["gameName"], "ghost");
    assert_eq!(tools["items"][0]["gameDisplayName"], "");
    assert_eq!(tools["items"][0]["gameStatus"], "active");
}

#[tokio::test]
async fn rebuild_is_stable() {
    let site = TempDir::new().unwrap();
    seed_site(&site);
    let content = site.path().join("content");
    let builder = IndexBuilder::new(&content);

    builder.build_all().await.unwrap();
    let first = std::fs::read_to_string(content.join("builds/index.json")).unwrap();
    builder.build_all().await.unwrap();
    let second = std::fs::read_to_string(content.join("builds/index.json")).unwrap();

    assert_eq!(first, second);
    site.child("content/builds/.index.json.tmp")
        .assert(predicate::path::missing());
}

#[tokio::test]
async fn catalog_reads_generated_indexes() {
    let site = TempDir::new().unwrap();
    seed_site(&site);
    let content = site.path().join("content");
    IndexBuilder::new(&content).build_all().await.unwrap();

    let source = FsSource::new(&content);
    let mut context = LoaderContext::new(2);
    context.load(&source, &Collection::ALL).await;

    for collection in Collection::ALL {
        assert!(context.error(collection).is_none(), "{} failed", collection);
    }
    assert_eq!(context.total(Collection::Builds), 3);

    context.apply(
        "minion",
        SearchFilters {
            game: Some("poe".to_string()),
            ..Default::default()
        },
    );
    let slugs: Vec<&str> = context.builds().visible().map(|b| b.slug.as_str()).collect();
    assert_eq!(slugs, vec!["necro"]);

    context.apply(
        "",
        SearchFilters {
            status: Some(GameStatus::Archived),
            ..Default::default()
        },
    );
    assert_eq!(context.total(Collection::Games), 1);
    assert_eq!(context.total(Collection::Builds), 1);

    let detail = fetch_detail(&source, Collection::Guides, "act-1").await.unwrap();
    assert_eq!(detail["resource"], "Gold");
    assert!(fetch_detail(&source, Collection::Guides, "nope")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn render_writes_card_fragments() {
    let site = TempDir::new().unwrap();
    seed_site(&site);
    let content = site.path().join("content");
    IndexBuilder::new(&content).build_all().await.unwrap();

    let mut context = LoaderContext::new(12);
    context.load(&FsSource::new(&content), &[Collection::Tools]).await;

    let service = RenderService::new(site.path().join("cards"));
    service
        .write_fragment(Collection::Tools, &render_cards(context.tools().visible()))
        .await
        .unwrap();

    site.child("cards/tools.html")
        .assert(predicate::str::contains(r#"data-slug="planner""#))
        .assert(predicate::str::contains("Passive Planner"));
}

#[tokio::test]
async fn touch_then_rebuild_reorders_builds() {
    let site = TempDir::new().unwrap();
    seed_site(&site);
    let content = site.path().join("content");

    let today = chrono::NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    let outcomes = TouchService::new(site.path(), "content")
        .touch(&["content/builds/barb.json".to_string()], today)
        .await;
    assert!(matches!(outcomes[0], TouchOutcome::Updated(_)));

    IndexBuilder::new(&content).build_all().await.unwrap();
    assert_eq!(index_slugs(&content, "builds")[0], "barb");
}
