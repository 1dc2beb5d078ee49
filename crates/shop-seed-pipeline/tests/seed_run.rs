mod support;

use std::fs;
use std::sync::Arc;

use shop_seed_core::rules::disclosure_sentence;
use shop_seed_core::{Collection, EntityKind, NewRow, OrderDocument};
use shop_seed_pipeline::{PipelineError, Seeder, Stage};
use support::{config, dataset, executor, FaultyGateway, StubDownloader, TestResult};

#[tokio::test]
async fn full_run_populates_every_stage() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    let downloader = Arc::new(StubDownloader::default());
    let seeder = Seeder::new(store.clone(), downloader.clone()).with_rng_seed(7);

    let report = seeder.run(&config(dist.path())?, &dataset()?).await?;

    assert_eq!(report.stages.len(), Stage::ORDER.len());
    assert_eq!(report.total_failed(), 0);
    assert_eq!(report.stage(Stage::Users).map(|s| s.failed), Some(0));
    assert_eq!(report.stage(Stage::Memories).map(|s| s.skipped), Some(1));

    assert_eq!(store.run(|s| s.count_all(EntityKind::User)).await?, 12);
    assert_eq!(store.run(|s| s.count_live(EntityKind::User)).await?, 11);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Product)).await?, 6);
    assert_eq!(store.run(|s| s.count_live(EntityKind::Product)).await?, 4);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Basket)).await?, 5);
    assert_eq!(store.run(|s| s.count_all(EntityKind::BasketItem)).await?, 8);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Recycle)).await?, 9);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Quantity)).await?, 6);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Wallet)).await?, 10);
    assert_eq!(store.run(|s| s.count_all(EntityKind::DeliveryMethod)).await?, 2);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Memory)).await?, 3);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Hint)).await?, 2);
    // admin and jim from their profiles, john and emma from the memories
    assert_eq!(store.run(|s| s.count_all(EntityKind::SecurityAnswer)).await?, 4);
    assert_eq!(store.run(|s| s.document_count(Collection::Orders)).await?, 2);
    assert_eq!(store.run(|s| s.document_count(Collection::Reviews)).await?, 1);

    assert_eq!(report.blueprint_file.as_deref(), Some("JuiceShop.stl"));
    assert_eq!(report.downloads.joined, 1);
    assert_eq!(report.downloads.failed, 0);
    let urls = downloader.urls();
    assert!(urls.iter().any(|url| url.ends_with("orange_juice.jpg")));
    assert!(urls.iter().any(|url| url.ends_with("JuiceShop.stl")));
    assert!(urls.iter().any(|url| url.ends_with("favorite-hiking-place.png")));

    let integrity = store.run(|s| s.integrity_check()).await?;
    assert!(integrity.quick_check_ok);
    assert!(integrity.foreign_key_violations.is_empty());
    Ok(())
}

#[tokio::test]
async fn flagged_users_are_soft_deleted() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    Seeder::new(store.clone(), Arc::new(StubDownloader::default()))
        .run(&config(dist.path())?, &dataset()?)
        .await?;

    let chris = store.run(|s| s.user_by_email("chris@acme.test")).await?;
    assert_eq!(chris.map(|user| user.deleted), Some(true));
    let google = store.run(|s| s.user_by_email("bjoernGoogle")).await?;
    assert_eq!(google.map(|user| user.deleted), Some(false));
    Ok(())
}

#[tokio::test]
async fn challenges_carry_environment_and_hint_rules() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    Seeder::new(store.clone(), Arc::new(StubDownloader::default()))
        .run(&config(dist.path())?, &dataset()?)
        .await?;

    let xxe = store
        .run(|s| s.challenge_by_key("xxeFileDisclosureChallenge"))
        .await?
        .unwrap_or_else(|| panic!("xxe challenge missing"));
    assert_eq!(xxe.disabled_env.as_deref(), Some("Docker"));
    assert!(xxe.description.ends_with(&disclosure_sentence("Docker")));
    assert_eq!(xxe.mitigation_url, None);

    let score_board = store
        .run(|s| s.challenge_by_key("scoreBoardChallenge"))
        .await?
        .unwrap_or_else(|| panic!("score board challenge missing"));
    assert_eq!(score_board.mitigation_url, None);
    assert_eq!(score_board.tutorial_order, Some(1));
    assert_eq!(score_board.disabled_env, None);

    let hints = store.run(move |s| s.list_hints(score_board.id)).await?;
    let orders = hints.iter().map(|hint| hint.order).collect::<Vec<_>>();
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(
        hints[0].text,
        "Try to find a reference or clue behind the scenes of Acme Juice Shop."
    );
    assert!(hints.iter().all(|hint| !hint.unlocked));
    Ok(())
}

#[tokio::test]
async fn disabled_challenges_keep_their_mitigation_link() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    let mut config = config(dist.path())?;
    config.challenges.show_mitigations = true;

    Seeder::new(store.clone(), Arc::new(StubDownloader::default()))
        .run(&config, &dataset()?)
        .await?;

    let xxe = store
        .run(|s| s.challenge_by_key("xxeFileDisclosureChallenge"))
        .await?
        .unwrap_or_else(|| panic!("xxe challenge missing"));
    assert!(xxe.description.ends_with(&disclosure_sentence("Docker")));
    assert_eq!(
        xxe.mitigation_url.as_deref(),
        Some("https://cheatsheetseries.owasp.org/cheatsheets/XML_External_Entity_Prevention_Cheat_Sheet.html")
    );

    let score_board = store
        .run(|s| s.challenge_by_key("scoreBoardChallenge"))
        .await?
        .unwrap_or_else(|| panic!("score board challenge missing"));
    assert_eq!(score_board.disabled_env, None);
    assert_eq!(score_board.mitigation_url.as_deref(), Some("https://cheatsheetseries.owasp.org/"));
    Ok(())
}

#[tokio::test]
async fn hints_are_skipped_when_disabled() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    let mut config = config(dist.path())?;
    config.challenges.show_hints = false;

    let report = Seeder::new(store.clone(), Arc::new(StubDownloader::default()))
        .run(&config, &dataset()?)
        .await?;

    assert_eq!(report.stage(Stage::Challenges).map(|s| s.created), Some(3));
    assert_eq!(store.run(|s| s.count_all(EntityKind::Hint)).await?, 0);
    Ok(())
}

#[tokio::test]
async fn tamper_product_rewrites_its_challenge() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    let report = Seeder::new(store.clone(), Arc::new(StubDownloader::default()))
        .run(&config(dist.path())?, &dataset()?)
        .await?;
    assert_eq!(report.stage(Stage::Products).map(|s| s.skipped), Some(0));

    let challenge = store
        .run(|s| s.challenge_by_key("changeProductChallenge"))
        .await?
        .unwrap_or_else(|| panic!("tamper challenge missing"));
    assert!(challenge.description.contains("within the Forensic Tool product description"));
    assert!(challenge.description.contains("<i>https://acme.test/tools</i>"));
    assert!(!challenge.description.contains("O-Saft"));
    Ok(())
}

#[tokio::test]
async fn orders_are_priced_from_product_snapshots() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    Seeder::new(store.clone(), Arc::new(StubDownloader::default()))
        .run(&config(dist.path())?, &dataset()?)
        .await?;

    let documents = store.run(|s| s.documents(Collection::Orders)).await?;
    let orders = documents
        .into_iter()
        .map(|document| serde_json::from_value::<OrderDocument>(document.body))
        .collect::<Result<Vec<_>, _>>()?;

    let admin = orders
        .iter()
        .find(|order| order.email == "admin@acme.test")
        .unwrap_or_else(|| panic!("admin order missing"));
    assert_eq!(admin.state, "delivered");
    assert_eq!(admin.order_lines.len(), 2);
    assert!((admin.total_price - (3.0 * 1.99 + 2.99)).abs() < 1e-9);
    assert_eq!(admin.bonus, 0);
    assert_eq!(admin.payment_id.len(), 11);

    let jim = orders
        .iter()
        .find(|order| order.email == "jim@acme.test")
        .unwrap_or_else(|| panic!("jim order missing"));
    assert_eq!(jim.state, "processing");
    assert!((jim.total_price - 3.0 * 8.99).abs() < 1e-9);
    assert_eq!(jim.bonus, 3);
    Ok(())
}

#[tokio::test]
async fn rerunning_duplicates_records() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    let seeder = Seeder::new(store.clone(), Arc::new(StubDownloader::default()));
    let config = config(dist.path())?;
    let dataset = dataset()?;

    seeder.run(&config, &dataset).await?;
    let second = seeder.run(&config, &dataset).await?;

    // users, their two security answers, one feedback and one address each
    assert_eq!(second.stage(Stage::Users).map(|s| s.created), Some(10 + 2 + 1 + 10));
    assert_eq!(second.stage(Stage::Users).map(|s| s.failed), Some(0));
    // challenge keys are unique, so only they collide
    assert_eq!(second.stage(Stage::Challenges).map(|s| s.failed), Some(3));
    assert_eq!(store.run(|s| s.count_all(EntityKind::User)).await?, 24);
    assert_eq!(store.run(|s| s.count_all(EntityKind::SecurityQuestion)).await?, 4);
    Ok(())
}

#[tokio::test]
async fn failed_records_do_not_stop_their_siblings() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    let gateway = FaultyGateway::new(store.clone(), |row| {
        matches!(row, NewRow::User(user) if user.email == "bender@acme.test")
    });

    let report = Seeder::new(Arc::new(gateway), Arc::new(StubDownloader::default()))
        .run(&config(dist.path())?, &dataset()?)
        .await?;

    assert_eq!(report.stage(Stage::Users).map(|s| s.failed), Some(1));
    assert_eq!(store.run(|s| s.count_all(EntityKind::User)).await?, 11);
    // bender owns a basket, a basket item, a complaint, two recycles and a wallet
    assert_eq!(store.run(|s| s.count_all(EntityKind::Basket)).await?, 4);
    assert_eq!(store.run(|s| s.count_all(EntityKind::BasketItem)).await?, 7);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Complaint)).await?, 0);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Recycle)).await?, 7);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Wallet)).await?, 9);
    assert!(report.stage(Stage::Recycles).is_some_and(|s| s.skipped == 2));
    Ok(())
}

#[tokio::test]
async fn product_failure_aborts_the_run() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    let gateway = FaultyGateway::new(store.clone(), |row| {
        matches!(row, NewRow::Product(product) if product.name.starts_with("Orange"))
    });

    let result = Seeder::new(Arc::new(gateway), Arc::new(StubDownloader::default()))
        .run(&config(dist.path())?, &dataset()?)
        .await;

    match result {
        Err(PipelineError::FatalDependency { kind, key, .. }) => {
            assert_eq!(kind, EntityKind::Product);
            assert_eq!(key, "Orange Juice (1000ml)");
        }
        other => panic!("expected a fatal product error, got {other:?}"),
    }
    assert_eq!(store.run(|s| s.count_all(EntityKind::Basket)).await?, 0);
    Ok(())
}

#[tokio::test]
async fn output_tree_is_rebranded() -> TestResult {
    let dist = tempfile::tempdir()?;
    let index = dist.path().join("frontend/index.html");
    fs::create_dir_all(dist.path().join("frontend"))?;
    fs::write(&index, "<title>OWASP Juice Shop</title><script>OWASP_JUICE_SHOP</script>")?;

    let report = Seeder::new(executor()?, Arc::new(StubDownloader::default()))
        .run(&config(dist.path())?, &dataset()?)
        .await?;

    let rewritten = fs::read_to_string(&index)?;
    assert!(rewritten.contains("<title>Acme Juice Shop</title>"));
    assert!(!rewritten.contains("OWASP_JUICE_SHOP"));
    assert!(report.rewrite.is_some_and(|summary| summary.files_rewritten >= 1));
    Ok(())
}

#[tokio::test]
async fn unreachable_assets_are_logged_not_fatal() -> TestResult {
    let dist = tempfile::tempdir()?;
    let store = executor()?;
    let mut config = config(dist.path())?;
    config.products[1].image = Some("https://unreachable.acme.test/orange.jpg".to_string());

    let report = Seeder::new(store.clone(), Arc::new(StubDownloader::default()))
        .run(&config, &dataset()?)
        .await?;

    assert_eq!(report.downloads.failed, 1);
    assert_eq!(store.run(|s| s.count_all(EntityKind::Product)).await?, 6);
    Ok(())
}

#[tokio::test]
async fn snippet_markers_tag_coding_challenges() -> TestResult {
    let dist = tempfile::tempdir()?;
    let snippets = tempfile::tempdir()?;
    fs::write(
        snippets.path().join("scoreBoard.ts"),
        "// vuln-code-snippet start scoreBoardChallenge\nconst routes = []\n// vuln-code-snippet end scoreBoardChallenge\n",
    )?;
    let store = executor()?;
    let mut config = config(dist.path())?;
    config.challenges.code_snippets_dir = Some(snippets.path().to_path_buf());

    let report = Seeder::new(store.clone(), Arc::new(StubDownloader::default()))
        .run(&config, &dataset()?)
        .await?;
    assert_eq!(report.coding_challenges, 1);

    let challenges = store.run(|s| s.list_challenges()).await?;
    let score_board = challenges
        .iter()
        .find(|challenge| challenge.key == "scoreBoardChallenge")
        .unwrap_or_else(|| panic!("score board challenge missing"));
    assert!(score_board.has_coding_challenge);
    assert_eq!(score_board.tags.as_deref(), Some("Tutorial,With Coding Challenge"));
    assert!(challenges
        .iter()
        .filter(|challenge| challenge.key != "scoreBoardChallenge")
        .all(|challenge| !challenge.has_coding_challenge));
    Ok(())
}
