use httpmock::prelude::*;
use order_consolidator::adapters::store_locator::{FamilyMartLocator, SevenElevenLocator, StoreLocator};
use order_consolidator::domain::model::Company;
use order_consolidator::domain::ports::{AddressLookup, LookupError};
use reqwest::Client;

fn seven(server: &MockServer) -> SevenElevenLocator {
    SevenElevenLocator::new(Client::new(), server.url("/EMapSDK.aspx"))
}

fn family(server: &MockServer, key: Option<&str>) -> FamilyMartLocator {
    FamilyMartLocator::new(
        Client::new(),
        server.url("/net/familyShop.aspx"),
        "https://www.family.com.tw/",
        key.map(str::to_string),
    )
}

#[tokio::test]
async fn test_seven_eleven_form_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/EMapSDK.aspx")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .x_www_form_urlencoded_tuple("commandid", "SearchStore")
            .x_www_form_urlencoded_tuple("StoreName", "鑫德");
        then.status(200).body(
            "<iMapSDKOutput><GeoPosition><POIName>鑫德</POIName>\
             <Address>台北市中正區忠孝西路一段66號</Address></GeoPosition></iMapSDKOutput>",
        );
    });

    let address = seven(&server).search("鑫德門市").await.unwrap();

    mock.assert();
    assert_eq!(address, "台北市中正區忠孝西路一段66號");
}

#[tokio::test]
async fn test_seven_eleven_empty_and_ambiguous() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).x_www_form_urlencoded_tuple("StoreName", "無此店");
        then.status(200).body("<iMapSDKOutput></iMapSDKOutput>");
    });
    server.mock(|when, then| {
        when.method(POST).x_www_form_urlencoded_tuple("StoreName", "中山");
        then.status(200).body(
            "<r><GeoPosition><POIName>中山</POIName><Address>台北市</Address></GeoPosition>\
             <GeoPosition><POIName>中山</POIName><Address>台中市</Address></GeoPosition></r>",
        );
    });

    let locator = seven(&server);
    assert_eq!(
        locator.search("無此店門市").await,
        Err(LookupError::NotFound("無此店門市".to_string()))
    );
    assert_eq!(
        locator.search("中山門市").await,
        Err(LookupError::Ambiguous {
            store: "中山門市".to_string(),
            count: 2
        })
    );
}

#[tokio::test]
async fn test_family_mart_query_and_referer() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/net/familyShop.aspx")
            .query_param("searchType", "ShopName")
            .query_param("kw", "全家中山店")
            .query_param("fun", "getByName")
            .query_param("key", "secret")
            .header("Referer", "https://www.family.com.tw/");
        then.status(200).body(
            r#"getByName([{"NAME":"全家中山店","addr":"台北市中山區","TEL":"02"},{"NAME":"全家中山新店","addr":"新北市"}])"#,
        );
    });

    let address = family(&server, Some("secret")).search("全家中山店").await.unwrap();

    mock.assert();
    assert_eq!(address, "台北市中山區");
}

#[tokio::test]
async fn test_family_mart_http_failure_is_transport_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/net/familyShop.aspx");
        then.status(503);
    });

    let result = family(&server, None).search("全家中山店").await;
    assert!(matches!(result, Err(LookupError::TransportError(_))));
}

#[tokio::test]
async fn test_store_locator_dispatches_by_company() {
    let server = MockServer::start();
    let seven_mock = server.mock(|when, then| {
        when.method(POST).path("/EMapSDK.aspx");
        then.status(200).body(
            "<r><GeoPosition><POIName>鑫德</POIName><Address>7-11地址</Address></GeoPosition></r>",
        );
    });
    let family_mock = server.mock(|when, then| {
        when.method(GET).path("/net/familyShop.aspx");
        then.status(200).body(r#"([{"NAME":"鑫德","addr":"全家地址"}])"#);
    });

    let locator = StoreLocator::new(seven(&server), family(&server, None));

    assert_eq!(locator.lookup(Company::Seven, "鑫德門市").await.unwrap(), "7-11地址");
    assert_eq!(locator.lookup(Company::Family, "鑫德").await.unwrap(), "全家地址");
    assert!(matches!(
        locator.lookup(Company::Tacat, "鑫德").await,
        Err(LookupError::NotFound(_))
    ));

    seven_mock.assert_hits(1);
    family_mock.assert_hits(1);
}
