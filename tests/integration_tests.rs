use chrono::NaiveDate;
use httpmock::prelude::*;
use order_consolidator::adapters::{CsvAddressCache, InMemoryAddressCache, OfflineLookup, StoreLocator};
use order_consolidator::config::toml_config::LocatorSettings;
use order_consolidator::{
    CliConfig, ConsolidatorConfig, EtlEngine, EtlError, LocalStorage, OrderPipeline,
    ProductCatalog,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CATALOG_JSON: &str = r#"{
    "bagel001-2EA": { "qty": 2, "mixx_name": ["低糖草莓乳酪貝果 (2入)"] },
    "bagel007-2EA": { "qty": 2, "mixx_name": ["法式AOP極致奶油貝果 (2入)"] },
    "bagel101-1PK-999": { "qty": 14, "mixx_name": "減醣貝果14天體驗組 (14入)" }
}"#;

const SHOPLINE_CSV: &str = "訂單號碼,訂單日期,送貨方式,收件人,收件人電話號碼,門市名稱,商品貨號,商品名稱,選項,數量,完整地址,出貨備註,到貨時間\n\
S100,2025-01-05 10:00:00,7-11低溫取貨（冷凍）,王小明,0912345678,鑫德門市,bagel001-2EA,草莓乳酪貝果,,1,,,\n\
S101,2025-01-05 11:00:00,全家低溫取貨,林小姐,0922333444,全家中山店,bagel101-1PK-999,體驗組,,1,,請冷凍,上午到貨\n\
S100,2025-01-05 10:00:00,7-11低溫取貨（冷凍）,王小明,0912345678,鑫德門市,bagel007-2EA,奶油貝果,,2,,,\n\
S102,2025-01-06 09:30:00,低溫宅配（黑貓）,陳先生,0933444555,,bagel101-1PK-999,體驗組,,4,高雄市前鎮區,,\n\
,2025-01-06 09:30:00,低溫宅配,陳先生,0933444555,,,贈品,,1,高雄市前鎮區,,\n";

const SEVEN_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<iMapSDKOutput><GeoPosition><POIID>131386</POIID><POIName>鑫德</POIName><Address>台北市中正區忠孝西路一段66號</Address></GeoPosition></iMapSDKOutput>"#;

const FAMILY_BODY: &str =
    r#"getByName([{"NAME":"全家中山店","addr":"台北市中山區南京東路1號","TEL":"02-12345678"}])"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(orders: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("orders.csv"), orders).unwrap();
        std::fs::write(dir.path().join("product_config.json"), CATALOG_JSON).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_str().unwrap().to_string()
    }

    fn cli(&self) -> CliConfig {
        CliConfig {
            input: self.path("orders.csv"),
            output_path: self.path("out"),
            output_name: "shipments.csv".to_string(),
            platform: None,
            catalog: self.path("product_config.json"),
            address_cache: Some(self.path("store_cache.csv")),
            config: None,
            offline: false,
            json_logs: false,
            verbose: false,
        }
    }
}

fn read_output(path: &str) -> Vec<HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(Path::new(path)).unwrap();
    reader.deserialize().map(|row| row.unwrap()).collect()
}

fn locator_settings(server: &MockServer) -> LocatorSettings {
    LocatorSettings {
        seven_url: server.url("/EMapSDK.aspx"),
        family_url: server.url("/net/familyShop.aspx"),
        family_referer: "https://www.family.com.tw/".to_string(),
        family_api_key: Some("test-key".to_string()),
        timeout_seconds: 5,
    }
}

async fn run_shopline(workspace: &Workspace, server: &MockServer) -> Result<String, EtlError> {
    let config = workspace.cli();
    let settings = Arc::new(ConsolidatorConfig {
        locator: locator_settings(server),
        ..Default::default()
    });
    let catalog = ProductCatalog::load(&config.catalog);
    let locator = StoreLocator::from_settings(&settings.locator)?;
    let cache = CsvAddressCache::load(workspace.path("store_cache.csv"))?;

    let pipeline = OrderPipeline::new(LocalStorage::new("."), config, settings, catalog, locator, cache);
    EtlEngine::new(pipeline).run().await
}

#[tokio::test]
async fn test_shopline_end_to_end_with_store_lookups() {
    let workspace = Workspace::new(SHOPLINE_CSV);
    let server = MockServer::start();

    let seven_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/EMapSDK.aspx")
            .x_www_form_urlencoded_tuple("commandid", "SearchStore")
            .x_www_form_urlencoded_tuple("StoreName", "鑫德");
        then.status(200).body(SEVEN_XML);
    });
    let family_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/net/familyShop.aspx")
            .query_param("kw", "全家中山店")
            .query_param("key", "test-key")
            .header("Referer", "https://www.family.com.tw/");
        then.status(200).body(FAMILY_BODY);
    });

    let output = run_shopline(&workspace, &server).await.unwrap();
    assert!(output.ends_with("out/shipments.csv"));
    seven_mock.assert_hits(1);
    family_mock.assert_hits(1);

    let rows = read_output(&output);
    let summary: Vec<(String, String)> = rows
        .iter()
        .map(|row| (row["貨主單號"].clone(), row["商品編號"].clone()))
        .collect();

    // 依收件人排序: 林 < 王 < 陳
    assert_eq!(
        summary,
        vec![
            ("S101".to_string(), "bagel101-1PK-999".to_string()),
            ("S101".to_string(), "box60-EA".to_string()),
            ("S100".to_string(), "bagel001-2EA".to_string()),
            ("S100".to_string(), "bagel007-2EA".to_string()),
            ("S100".to_string(), "box60-EA".to_string()),
            ("S102".to_string(), "bagel101-1PK-999".to_string()),
            ("S102".to_string(), "ERROR-needs-split".to_string()),
        ]
    );

    assert_eq!(rows[0]["收貨人地址"], "全家中山店 (台北市中山區南京東路1號)");
    assert_eq!(rows[0]["配送方式"], "全家");
    assert_eq!(rows[0]["到貨時段"], "1");
    assert_eq!(rows[0]["訂單 / 宅配單備註"], "減醣市集/請冷凍");
    assert_eq!(rows[1]["品項備註"], "box");
    assert_eq!(rows[1]["訂購數量"], "1");
    assert_eq!(rows[2]["收貨人地址"], "(home-converted)台北市中正區忠孝西路一段66號");
    assert_eq!(rows[2]["配送方式"], "7-11");
    assert_eq!(rows[5]["配送方式"], "Tcat");
    assert_eq!(rows[5]["收貨人地址"], "高雄市前鎮區");
    assert_eq!(rows[5]["訂購日期"], "20250106");
    assert!(rows.iter().all(|row| row["指定配送溫層"] == "003" && row["貨主編號"] == "A442"));

    let cache = std::fs::read_to_string(workspace.path("store_cache.csv")).unwrap();
    assert!(cache.contains("SEVEN,鑫德門市,台北市中正區忠孝西路一段66號"));
    assert!(cache.contains("FAMILY,全家中山店,台北市中山區南京東路1號"));
}

#[tokio::test]
async fn test_second_run_uses_persisted_cache() {
    let workspace = Workspace::new(SHOPLINE_CSV);
    let server = MockServer::start();

    let seven_mock = server.mock(|when, then| {
        when.method(POST).path("/EMapSDK.aspx");
        then.status(200).body(SEVEN_XML);
    });
    let family_mock = server.mock(|when, then| {
        when.method(GET).path("/net/familyShop.aspx");
        then.status(200).body(FAMILY_BODY);
    });

    let first = run_shopline(&workspace, &server).await.unwrap();
    let first_output = std::fs::read(&first).unwrap();

    let second = run_shopline(&workspace, &server).await.unwrap();
    let second_output = std::fs::read(&second).unwrap();

    seven_mock.assert_hits(1);
    family_mock.assert_hits(1);
    assert_eq!(first_output, second_output);
}

#[tokio::test]
async fn test_failed_lookups_still_produce_output() {
    let workspace = Workspace::new(SHOPLINE_CSV);
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/EMapSDK.aspx");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/net/familyShop.aspx");
        then.status(200).body("getByName([])");
    });

    let output = run_shopline(&workspace, &server).await.unwrap();
    let rows = read_output(&output);

    assert!(rows[0]["收貨人地址"].starts_with("全家中山店 (ERROR"));
    assert!(rows[2]["收貨人地址"].contains("ERROR"));
    assert_eq!(rows.len(), 7);
    // 查詢失敗不寫入快取
    assert!(!Path::new(&workspace.path("store_cache.csv")).exists());
}

#[tokio::test]
async fn test_mixx_offline_uses_injected_date() {
    let orders = "*銷售單號,收件人,收件人手機,收件地址,品名/規格,採購數量,備註\n\
M001,陳先生,0922333444,台中市西屯區,減醣市集｜法式AOP極致奶油貝果 (2入),3,\n\
M001,陳先生,0922333444,台中市西屯區,減醣市集｜減醣貝果14天體驗組 (14入),1,下午送\n\
,陳先生,0922333444,台中市西屯區,減醣市集｜低糖草莓乳酪貝果 (2入),1,\n";
    let workspace = Workspace::new(orders);
    let config = CliConfig {
        offline: true,
        address_cache: None,
        ..workspace.cli()
    };
    let catalog = ProductCatalog::load(&config.catalog);

    let pipeline = OrderPipeline::new(
        LocalStorage::new("."),
        config,
        Arc::new(ConsolidatorConfig::default()),
        catalog,
        OfflineLookup,
        InMemoryAddressCache::new(),
    )
    .with_today(NaiveDate::from_ymd_opt(2025, 2, 14).unwrap());

    let output = EtlEngine::new(pipeline).run().await.unwrap();
    let rows = read_output(&output);

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["商品編號"], "bagel007-2EA");
    assert_eq!(rows[1]["訂單 / 宅配單備註"], "減醣市集/下午送");
    // 缺銷售單號的列先結束 M001 的分組，本身不裝箱
    assert_eq!(rows[2]["商品編號"], "box90-EA");
    assert_eq!(rows[3]["貨主單號"], "");
    assert!(rows.iter().all(|row| row["訂購日期"] == "20250214"));
}

#[tokio::test]
async fn test_explicit_platform_mismatch_aborts() {
    let workspace = Workspace::new(SHOPLINE_CSV);
    let config = CliConfig {
        platform: Some(order_consolidator::Platform::C2c),
        ..workspace.cli()
    };

    let pipeline = OrderPipeline::new(
        LocalStorage::new("."),
        config,
        Arc::new(ConsolidatorConfig::default()),
        ProductCatalog::default(),
        OfflineLookup,
        InMemoryAddressCache::new(),
    );

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();
    assert!(matches!(err, EtlError::SchemaMismatch { .. }));
    assert!(!Path::new(&workspace.path("out/shipments.csv")).exists());
}

#[tokio::test]
async fn test_unknown_product_aborts_run() {
    let orders = "訂單號碼,訂單日期,送貨方式,收件人,收件人電話號碼,門市名稱,商品貨號,商品名稱,數量,完整地址\n\
S1,2025-01-05 10:00:00,低溫宅配,王,09,,ghost-1EA,幽靈商品,1,台北市\n";
    let workspace = Workspace::new(orders);

    let pipeline = OrderPipeline::new(
        LocalStorage::new("."),
        workspace.cli(),
        Arc::new(ConsolidatorConfig::default()),
        ProductCatalog::load(workspace.path("product_config.json")),
        OfflineLookup,
        InMemoryAddressCache::new(),
    );

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();
    assert!(matches!(err, EtlError::ProductNotFound { .. }));
}
