#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use shop_seed_core::{Collection, EntityKind, NewRow, SeedConfig, StaticDataset};
use shop_seed_pipeline::{AssetError, Downloader, Gateway, GatewayError, StoreExecutor};
use shop_seed_store_sqlite::SqliteStore;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn executor() -> anyhow::Result<Arc<StoreExecutor>> {
    let mut store = SqliteStore::open(Path::new(":memory:"))?;
    store.migrate()?;
    Ok(Arc::new(StoreExecutor::new(store)))
}

/// Writes the URL into the destination instead of fetching it.
#[derive(Default)]
pub struct StubDownloader {
    urls: Mutex<Vec<String>>,
}

impl StubDownloader {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Downloader for StubDownloader {
    async fn download(&self, url: &str, destination: &Path) -> Result<(), AssetError> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).push(url.to_string());
        if url.contains("unreachable") {
            return Err(AssetError::Network("HTTP 503: Service Unavailable".to_string()));
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(destination, url.as_bytes())?;
        Ok(())
    }
}

type RowFilter = Box<dyn Fn(&NewRow) -> bool + Send + Sync>;

/// Forwards to a real store but rejects rows matching a filter.
pub struct FaultyGateway {
    inner: Arc<StoreExecutor>,
    reject: RowFilter,
}

impl FaultyGateway {
    pub fn new(inner: Arc<StoreExecutor>, reject: impl Fn(&NewRow) -> bool + Send + Sync + 'static) -> Self {
        Self { inner, reject: Box::new(reject) }
    }
}

#[async_trait]
impl Gateway for FaultyGateway {
    async fn create(&self, row: NewRow) -> Result<i64, GatewayError> {
        if (self.reject)(&row) {
            return Err(GatewayError::Store(format!("rejected {}", row.natural_key())));
        }
        self.inner.create(row).await
    }

    async fn destroy(&self, kind: EntityKind, id: i64) -> Result<(), GatewayError> {
        self.inner.destroy(kind, id).await
    }

    async fn update_challenge_description(
        &self,
        challenge_id: i64,
        description: String,
    ) -> Result<(), GatewayError> {
        self.inner.update_challenge_description(challenge_id, description).await
    }

    async fn insert_document(
        &self,
        collection: Collection,
        document: serde_json::Value,
    ) -> Result<(), GatewayError> {
        self.inner.insert_document(collection, document).await
    }
}

pub fn config(dist_dir: &Path) -> Result<SeedConfig, String> {
    SeedConfig::from_yaml(&format!(
        r#"
application:
  name: Acme Juice Shop
  domain: acme.test
  numberOfRandomFakeUsers: 2
challenges:
  showHints: true
  showMitigations: false
  safetyMode: auto
  activeEnvironments: [Docker]
  overwriteUrlForProductTamperingChallenge: https://acme.test/tools
paths:
  distDir: {dist}
products:
  - name: Apple Juice (1000ml)
    price: 1.99
    image: apple_juice.jpg
    reviews:
      - text: One of my favorites!
        author: admin
  - name: Orange Juice (1000ml)
    price: 2.99
    image: https://cdn.acme.test/images/orange_juice.jpg
    quantity: 7
    limitPerUser: 5
  - name: Eggfruit Juice (500ml)
    price: 8.99
    keywordsForPastebinDataLeakChallenge: [eggfruit]
  - name: Raspberry Juice (1000ml)
    price: 4.99
    fileForRetrieveBlueprintChallenge: https://cdn.acme.test/blueprints/JuiceShop.stl
  - name: Forensic Tool
    price: 0.01
    urlForProductTamperingChallenge: https://acme.test/forensic
  - name: Christmas Super-Surprise-Box (2014 Edition)
    price: 29.99
    useForChristmasSpecialChallenge: true
memories:
  - image: https://cdn.acme.test/memories/favorite-hiking-place.png
    caption: I love going hiking here...
    geoStalkingMetaSecurityQuestion: 1
    geoStalkingMetaSecurityAnswer: Daniel Boone National Forest
  - image: IMG_4253.jpg
    caption: My old workplace...
    geoStalkingVisualSecurityQuestion: 2
    geoStalkingVisualSecurityAnswer: ITsec
  - image: nobody.png
    caption: Owner left the company
    user: ghost
"#,
        dist = dist_dir.display()
    ))
}

const ADDRESS: &str = r"
    address:
      - fullName: Tim Tester
        mobileNum: 4917000000
        zipCode: 12345
        streetAddress: Test Street 1
        city: Testville
        country: Testland";

pub fn dataset() -> Result<StaticDataset, serde_yaml::Error> {
    let user = |key: &str, role: &str, extra: &str| {
        format!(
            "  - key: {key}\n    email: {key}\n    password: {key}123\n    role: {role}\n{extra}{ADDRESS}\n"
        )
    };
    let mut users = String::new();
    users.push_str(&user(
        "admin",
        "admin",
        "    securityQuestion:\n      id: 2\n      answer: '@xI98PxDO+06!'\n    feedback:\n      comment: I love this shop!\n      rating: 5\n    walletBalance: 100\n",
    ));
    users.push_str(&user("jim", "customer", "    securityQuestion:\n      id: 1\n      answer: Samuel\n"));
    users.push_str(&user("bender", "customer", ""));
    users.push_str(&user("amy", "customer", ""));
    users.push_str(&user("demo", "deluxe", "    walletBalance: 200\n"));
    users.push_str(&user("bjoernGoogle", "admin", "    customDomain: true\n"));
    users.push_str(&user("bjoernOwasp", "deluxe", ""));
    users.push_str(&user("john", "customer", ""));
    users.push_str(&user("emma", "customer", ""));
    users.push_str(&user("chris", "customer", "    deletedFlag: true\n"));

    let users: Vec<shop_seed_core::StaticUser> = serde_yaml::from_str(&users)?;
    let security_questions = serde_yaml::from_str(
        "- question: Your eldest siblings middle name?\n- question: Name of your favorite pet?\n",
    )?;
    let challenges = serde_yaml::from_str(
        r#"
- key: scoreBoardChallenge
  name: Score Board
  category: Miscellaneous
  tags: [Tutorial]
  description: Find the carefully hidden 'Score Board' page of OWASP Juice Shop.
  difficulty: 1
  hints:
    - Try to find a reference or clue behind the scenes of OWASP Juice Shop.
    - Or simply guess the URL.
  mitigationUrl: https://cheatsheetseries.owasp.org/
  tutorial:
    order: 1
- key: changeProductChallenge
  name: Product Tampering
  category: Broken Access Control
  description: Change the <code>href</code> of the link within the OWASP SSL Advanced Forensic Tool (O-Saft) product description into <i>https://owasp.slack.com</i>.
  difficulty: 3
- key: xxeFileDisclosureChallenge
  name: XXE Data Access
  category: XXE
  description: Retrieve the content of <code>C:\Windows\system.ini</code> or <code>/etc/passwd</code> from the server.
  difficulty: 3
  mitigationUrl: https://cheatsheetseries.owasp.org/cheatsheets/XML_External_Entity_Prevention_Cheat_Sheet.html
  disabledEnv: [Docker, Heroku]
"#,
    )?;
    let deliveries = serde_yaml::from_str(
        r"
- name: One Day Delivery
  price: 0.99
  deluxePrice: 0.5
  eta: 1
  icon: fas fa-rocket
- name: Standard Delivery
  price: 0
  deluxePrice: 0
  eta: 5
  icon: fas fa-shipping-fast
",
    )?;

    Ok(StaticDataset { security_questions, users, challenges, deliveries })
}
