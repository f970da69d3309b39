//! Static unit-price table: category → part type → size tier.
//!
//! Part types are kept in slices rather than maps because lookup is
//! first-match over substring containment, so declaration order matters.

use serde::Serialize;
use std::fmt;

/// Price returned when no category matches.
pub const GLOBAL_DEFAULT_PRICE: i64 = 500;

/// Category assigned to parts the LLM left uncategorised.
pub const FALLBACK_CATEGORY: &str = "その他";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl SizeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTier::Small => "small",
            SizeTier::Medium => "medium",
            SizeTier::Large => "large",
        }
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceEntry {
    Flat(i64),
    Tiered { small: i64, medium: i64, large: i64 },
}

impl PriceEntry {
    pub fn is_tiered(&self) -> bool {
        matches!(self, PriceEntry::Tiered { .. })
    }

    pub fn price_for(&self, tier: SizeTier) -> i64 {
        match *self {
            PriceEntry::Flat(price) => price,
            PriceEntry::Tiered {
                small,
                medium,
                large,
            } => match tier {
                SizeTier::Small => small,
                SizeTier::Medium => medium,
                SizeTier::Large => large,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PartType {
    pub keyword: &'static str,
    pub price: PriceEntry,
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryPrices {
    pub name: &'static str,
    pub part_types: &'static [PartType],
    pub default_price: i64,
}

impl CategoryPrices {
    /// First part type whose keyword occurs in `part_name`, case-insensitively.
    pub fn match_part_type(&self, part_name: &str) -> Option<&PartType> {
        let haystack = part_name.to_lowercase();
        self.part_types
            .iter()
            .find(|pt| haystack.contains(&pt.keyword.to_lowercase()))
    }
}

#[derive(Debug)]
pub struct PricingDatabase {
    categories: &'static [CategoryPrices],
    default_price: i64,
}

const fn tiered(keyword: &'static str, small: i64, medium: i64, large: i64) -> PartType {
    PartType {
        keyword,
        price: PriceEntry::Tiered {
            small,
            medium,
            large,
        },
    }
}

const METAL_PARTS: &[PartType] = &[
    tiered("フレーム", 800, 1500, 2500),
    tiered("支柱", 600, 1200, 2000),
    tiered("ブラケット", 300, 600, 1000),
    tiered("ネジ", 50, 80, 120),
    tiered("ボルト", 80, 150, 250),
    tiered("ナット", 30, 50, 80),
    tiered("ワッシャー", 20, 30, 50),
    tiered("アングル", 400, 800, 1400),
    tiered("プレート", 500, 1000, 1800),
    tiered("パイプ", 300, 600, 1200),
];

const RESIN_PARTS: &[PartType] = &[
    tiered("パネル", 1200, 2500, 4500),
    tiered("カバー", 800, 1600, 2800),
    tiered("棚板", 1500, 3000, 5500),
    tiered("装飾部品", 600, 1200, 2200),
    tiered("キャップ", 100, 200, 350),
    tiered("ガイド", 300, 600, 1100),
    tiered("ストッパー", 200, 400, 700),
];

const ELECTRONIC_PARTS: &[PartType] = &[
    tiered("LED", 500, 1000, 2000),
    tiered("配線", 200, 400, 800),
    tiered("スイッチ", 800, 1500, 2500),
    tiered("コネクタ", 300, 600, 1200),
    tiered("基板", 2000, 4000, 8000),
];

const GLASS_ACRYLIC_PARTS: &[PartType] = &[
    tiered("ガラス板", 2000, 4000, 8000),
    tiered("アクリル板", 1500, 3000, 6000),
    tiered("透明パネル", 1800, 3600, 7200),
];

const OTHER_PARTS: &[PartType] = &[
    tiered("ゴム部品", 150, 300, 600),
    tiered("シール", 100, 200, 400),
    tiered("クッション", 200, 400, 800),
];

const STANDARD_CATEGORIES: &[CategoryPrices] = &[
    CategoryPrices {
        name: "金属部品",
        part_types: METAL_PARTS,
        default_price: 500,
    },
    CategoryPrices {
        name: "樹脂部品",
        part_types: RESIN_PARTS,
        default_price: 800,
    },
    CategoryPrices {
        name: "電子部品",
        part_types: ELECTRONIC_PARTS,
        default_price: 1000,
    },
    CategoryPrices {
        name: "ガラス・アクリル",
        part_types: GLASS_ACRYLIC_PARTS,
        default_price: 2500,
    },
    CategoryPrices {
        name: FALLBACK_CATEGORY,
        part_types: OTHER_PARTS,
        default_price: 300,
    },
];

static STANDARD: PricingDatabase = PricingDatabase {
    categories: STANDARD_CATEGORIES,
    default_price: GLOBAL_DEFAULT_PRICE,
};

impl PricingDatabase {
    /// The built-in price table.
    pub fn standard() -> &'static PricingDatabase {
        &STANDARD
    }

    pub fn category(&self, name: &str) -> Option<&CategoryPrices> {
        let name = name.trim();
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn categories(&self) -> &[CategoryPrices] {
        self.categories
    }

    pub fn default_price(&self) -> i64 {
        self.default_price
    }

    /// Every (category, part type) pair in declaration order.
    pub fn part_types(&self) -> impl Iterator<Item = (&CategoryPrices, &PartType)> {
        self.categories
            .iter()
            .flat_map(|c| c.part_types.iter().map(move |pt| (c, pt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_categories() {
        let db = PricingDatabase::standard();
        let names: Vec<_> = db.categories().iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec!["金属部品", "樹脂部品", "電子部品", "ガラス・アクリル", "その他"]
        );
        assert_eq!(db.default_price(), 500);
    }

    #[test]
    fn test_category_defaults() {
        let db = PricingDatabase::standard();
        assert_eq!(db.category("金属部品").unwrap().default_price, 500);
        assert_eq!(db.category("樹脂部品").unwrap().default_price, 800);
        assert_eq!(db.category("電子部品").unwrap().default_price, 1000);
        assert_eq!(db.category("ガラス・アクリル").unwrap().default_price, 2500);
        assert_eq!(db.category("その他").unwrap().default_price, 300);
        assert!(db.category("木工部品").is_none());
    }

    #[test]
    fn test_match_is_first_in_declaration_order() {
        let db = PricingDatabase::standard();
        let resin = db.category("樹脂部品").unwrap();
        // Contains both カバー and パネル; パネル is declared first.
        let matched = resin.match_part_type("パネルカバー").unwrap();
        assert_eq!(matched.keyword, "パネル");
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let db = PricingDatabase::standard();
        let electronic = db.category("電子部品").unwrap();
        let matched = electronic.match_part_type("led strip").unwrap();
        assert_eq!(matched.keyword, "LED");
    }

    #[test]
    fn test_price_entry_tiers() {
        let entry = PriceEntry::Tiered {
            small: 1,
            medium: 2,
            large: 3,
        };
        assert!(entry.is_tiered());
        assert_eq!(entry.price_for(SizeTier::Small), 1);
        assert_eq!(entry.price_for(SizeTier::Medium), 2);
        assert_eq!(entry.price_for(SizeTier::Large), 3);
        assert_eq!(PriceEntry::Flat(7).price_for(SizeTier::Large), 7);
    }

    #[test]
    fn test_part_types_iteration() {
        let db = PricingDatabase::standard();
        assert_eq!(db.part_types().count(), 28);
        let (category, first) = db.part_types().next().unwrap();
        assert_eq!(category.name, "金属部品");
        assert_eq!(first.keyword, "フレーム");
    }
}
