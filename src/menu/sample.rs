//! Built-in seed data used when no menu or query file exists yet.

use crate::models::MenuItem;

struct SampleItem {
    name: &'static str,
    short_description: &'static str,
    long_description: &'static str,
    category: &'static str,
    price: u64,
}

const SAMPLE_ITEMS: &[SampleItem] = &[
    SampleItem {
        name: "Gỏi Ngó Sen Tôm Thịt",
        short_description: "Ngó sen giòn, tôm sú, thịt ba chỉ, cà rốt, lạc rang, nước mắm chua ngọt.",
        long_description: "Ngó sen tươi được sơ chế trắng giòn, trộn cùng tôm sú luộc, thịt ba chỉ thái sợi, cà rốt và rau răm. Rắc thêm đậu phộng rang và hành phi. Nước trộn gỏi chua ngọt cân bằng vị giác hoàn hảo.",
        category: "Khai Vị & Món Cuốn",
        price: 120_000,
    },
    SampleItem {
        name: "Gỏi Bưởi Tôm Khô",
        short_description: "Tép bưởi mọng nước, tôm khô một nắng, mực xé, chua ngọt thanh mát.",
        long_description: "Sử dụng bưởi da xanh hoặc Năm Roi mọng nước, tách tép nguyên vẹn. Trộn cùng tôm khô một nắng loại ngon, mực khô xé sợi và nước sốt chua ngọt đặc biệt. Món ăn kích thích vị giác, thanh mát và giàu vitamin.",
        category: "Khai Vị & Món Cuốn",
        price: 135_000,
    },
    SampleItem {
        name: "Bánh Xèo Miền Tây (Củ hũ dừa)",
        short_description: "Vỏ bánh vàng giòn, nhân tôm thịt, củ hũ dừa, đậu xanh, ăn kèm rau rừng.",
        long_description: "Chiếc bánh xèo size lớn, vỏ mỏng vàng ươm nhờ bột nghệ và nước cốt dừa, viền giòn rụm. Nhân bên trong gồm tôm đất, thịt ba chỉ, giá đỗ và đặc biệt là củ hũ dừa ngọt giòn. Ăn kèm rổ rau rừng (cải bẹ xanh, lá cóc, sao nhái).",
        category: "Món Bánh",
        price: 110_000,
    },
    SampleItem {
        name: "Bánh Khọt Vũng Tàu (Tôm tươi)",
        short_description: "Bánh tròn giòn rụm, nhân tôm tươi đỏ au, mỡ hành, bột tôm.",
        long_description: "Những chiếc bánh tròn nhỏ được chiên giòn trong khuôn dầu, bên trên là tôm tươi nguyên con, rắc thêm bột tôm cháy và mỡ hành thơm phức. Cuốn cùng lá cải xanh và chấm nước mắm chua ngọt pha đu đủ bào.",
        category: "Món Bánh",
        price: 95_000,
    },
    SampleItem {
        name: "Bánh Cuốn Thanh Trì Chả Quế",
        short_description: "Bánh tráng mỏng tang, hành phi, chả quế thơm, nước chấm tinh dầu cà cuống.",
        long_description: "Bánh cuốn tráng tay lớp mỏng tang, dai mềm, rắc hành phi vàng ruộm tự làm. Không nhân hoặc nhân thịt mộc nhĩ tuỳ chọn. Ăn kèm chả quế nướng thơm lừng và nước mắm chấm nhẹ dịu, có thể thêm tinh dầu cà cuống.",
        category: "Món Bánh",
        price: 85_000,
    },
];

/// Questions written to `queries.txt` on first run.
pub const SAMPLE_QUERIES: &[&str] = &[
    "Có những món nào trong menu?",
    "Phở bò giá bao nhiêu?",
    "Có món gà rán không?",
    "Tôi muốn đặt 2 phần phở bò và 1 ly trà sữa ít đường",
    "Món nào giao nhanh nhất?",
    "Cho tôi xem các món bún",
    "Bún chả có những tùy chọn gì?",
    "Tôi muốn đặt bánh mì không ớt giao lúc 12 giờ",
    "Có đồ uống gì?",
    "Mì xào hải sản làm từ nguyên liệu gì?",
];

pub fn sample_menu() -> Vec<MenuItem> {
    SAMPLE_ITEMS
        .iter()
        .map(|s| MenuItem {
            name: s.name.to_string(),
            short_description: s.short_description.to_string(),
            long_description: s.long_description.to_string(),
            category: s.category.to_string(),
            price: s.price,
            availability: true,
        })
        .collect()
}
