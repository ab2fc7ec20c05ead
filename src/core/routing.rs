//! Shopline 送貨方式判斷：宅配直接用訂單地址，超商取貨改用門市地址。

use crate::config::toml_config::{OrderSettings, ShippingSettings};
use crate::core::address::StoreAddressBook;
use crate::domain::model::{Company, ERROR_MARKER};
use crate::domain::orders::{present, text, ShoplineOrderLine};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingMethod {
    HomeDelivery,
    Pickup(Company),
    Unknown,
}

/// 只比對第一個全形左括號之前的文字
pub fn classify(method_text: &str, shipping: &ShippingSettings) -> ShippingMethod {
    let label = method_text
        .split_once('（')
        .map_or(method_text, |(head, _)| head)
        .trim();

    if label == shipping.home_delivery_label {
        ShippingMethod::HomeDelivery
    } else if label == shipping.family_pickup_label {
        ShippingMethod::Pickup(Company::Family)
    } else if label == shipping.seven_pickup_label {
        ShippingMethod::Pickup(Company::Seven)
    } else {
        ShippingMethod::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub method: String,
    pub address: String,
}

impl Delivery {
    pub fn new(method: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            address: address.into(),
        }
    }
}

pub fn route_delivery(
    line: &ShoplineOrderLine,
    book: &StoreAddressBook,
    order: &OrderSettings,
    shipping: &ShippingSettings,
) -> Delivery {
    let method_text = present(&line.shipping_method).unwrap_or_default();
    let store_name = present(&line.store_name);

    match classify(method_text, shipping) {
        ShippingMethod::HomeDelivery => {
            Delivery::new(&order.home_delivery_code, text(&line.full_address))
        }
        ShippingMethod::Pickup(company) => {
            let code = match company {
                Company::Seven => &shipping.seven_code,
                _ => &shipping.family_code,
            };
            let resolved = store_name.and_then(|store| Some((store, book.get(company, store)?)));
            match (company, resolved) {
                (_, None) => Delivery::new(code, ERROR_MARKER),
                (Company::Seven, Some((_, address))) => Delivery::new(
                    code,
                    format!("{}{}", shipping.seven_address_prefix, address),
                ),
                (_, Some((store, address))) => {
                    Delivery::new(code, format!("{} ({})", store, address))
                }
            }
        }
        ShippingMethod::Unknown => Delivery::new(&shipping.unknown_code, ERROR_MARKER),
    }
}

/// 先把需要查地址的門市依業者收集起來，整批解析
pub fn collect_store_names(
    lines: &[ShoplineOrderLine],
    shipping: &ShippingSettings,
) -> BTreeMap<Company, BTreeSet<String>> {
    let mut requests: BTreeMap<Company, BTreeSet<String>> = BTreeMap::new();
    for line in lines {
        let method_text = present(&line.shipping_method).unwrap_or_default();
        if let ShippingMethod::Pickup(company) = classify(method_text, shipping) {
            if let Some(store) = present(&line.store_name) {
                requests
                    .entry(company)
                    .or_default()
                    .insert(store.to_string());
            }
        }
    }
    requests
}
