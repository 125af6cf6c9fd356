//! Menu storage and the text documents the retriever indexes.

pub mod sample;

use anyhow::{Context, Result};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::models::MenuItem;

/// Menu backed by `menu.json` in the data directory.
pub struct MenuStore {
    items: Vec<MenuItem>,
    data_dir: PathBuf,
}

impl MenuStore {
    /// Load `menu.json`, seeding it with the sample menu when it does not exist.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let menu_path = data_dir.join("menu.json");

        if menu_path.exists() {
            let data = std::fs::read_to_string(&menu_path)
                .with_context(|| format!("Failed to read {}", menu_path.display()))?;
            let items: Vec<MenuItem> = serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse {}", menu_path.display()))?;
            return Ok(Self {
                items,
                data_dir: data_dir.to_path_buf(),
            });
        }

        tracing::info!("No menu found at {}, writing sample menu", menu_path.display());
        let store = Self {
            items: sample::sample_menu(),
            data_dir: data_dir.to_path_buf(),
        };
        store.save()?;
        Ok(store)
    }

    pub fn from_items(data_dir: &Path, items: Vec<MenuItem>) -> Self {
        Self {
            items,
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let menu_path = self.data_dir.join("menu.json");
        let data = serde_json::to_string_pretty(&self.items)?;
        std::fs::write(&menu_path, data)
            .with_context(|| format!("Failed to write {}", menu_path.display()))?;
        Ok(())
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// First item whose name contains `name`, ignoring case.
    pub fn get_item_by_name(&self, name: &str) -> Option<&MenuItem> {
        let needle = name.to_lowercase();
        self.items
            .iter()
            .find(|item| item.name.to_lowercase().contains(&needle))
    }

    /// Items whose name, descriptions or category contain `query`, ignoring case.
    pub fn search_items(&self, query: &str) -> Vec<&MenuItem> {
        let needle = query.to_lowercase();
        self.items
            .iter()
            .filter(|item| {
                [
                    &item.name,
                    &item.short_description,
                    &item.long_description,
                    &item.category,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// One retrieval document per menu item.
    pub fn documents(&self) -> Vec<String> {
        self.items.iter().map(item_document).collect()
    }

    /// Write the numbered documents to `menu.txt` and return the file content.
    pub fn save_documents(&self) -> Result<String> {
        let content = self
            .documents()
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("[Món {}]\n{doc}", i + 1))
            .collect::<Vec<_>>()
            .join("\n\n");

        let path = self.data_dir.join("menu.txt");
        std::fs::write(&path, &content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(content)
    }
}

fn item_document(item: &MenuItem) -> String {
    let status = if item.availability {
        "Vẫn còn hàng"
    } else {
        "Đã hết hàng"
    };

    let mut doc = String::new();
    // Writing into a String cannot fail
    let _ = write!(
        doc,
        "Tên món ăn: {}\n\
         Món thuộc hạng mục: {}\n\
         Miêu tả ngắn: {}\n\
         Miêu tả dài: {}\n\
         Đơn giá: {}VNĐ\n\
         Trạng thái: {status} cho món {}",
        item.name,
        item.category,
        item.short_description,
        item.long_description,
        format_price(item.price),
        item.name,
    );
    doc
}

/// Group digits in threes with commas: 120000 -> "120,000".
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
