//! Fixed scenario records seeded on every run.
//!
//! Users are named by dataset alias and products by their position in the
//! configured catalog; the pipeline resolves both through the run cache.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasketItemFixture {
    pub owner: &'static str,
    pub product_slot: usize,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackFixture {
    pub comment: &'static str,
    pub rating: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplaintFixture {
    pub author: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecycleFixture {
    pub owner: &'static str,
    pub quantity: u32,
    pub date: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineFixture {
    pub product_slot: usize,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFixture {
    pub owner: &'static str,
    pub lines: &'static [OrderLineFixture],
    pub state: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryFixture {
    pub owner: &'static str,
    pub image_path: &'static str,
    pub caption: &'static str,
}

pub const BASKET_OWNERS: [&str; 5] = ["admin", "jim", "bender", "amy", "demo"];

pub const BASKET_ITEMS: [BasketItemFixture; 8] = [
    BasketItemFixture { owner: "admin", product_slot: 0, quantity: 2 },
    BasketItemFixture { owner: "admin", product_slot: 1, quantity: 3 },
    BasketItemFixture { owner: "admin", product_slot: 2, quantity: 1 },
    BasketItemFixture { owner: "jim", product_slot: 3, quantity: 2 },
    BasketItemFixture { owner: "bender", product_slot: 3, quantity: 1 },
    BasketItemFixture { owner: "amy", product_slot: 3, quantity: 2 },
    BasketItemFixture { owner: "demo", product_slot: 2, quantity: 5 },
    BasketItemFixture { owner: "demo", product_slot: 3, quantity: 2 },
];

pub const ANONYMOUS_FEEDBACK: [FeedbackFixture; 4] = [
    FeedbackFixture {
        comment: "Incompetent customer support! Can't even upload photo of broken purchase!<br><em>Support Team: Sorry, only order confirmation PDFs can be attached to complaints!</em>",
        rating: 2,
    },
    FeedbackFixture { comment: "This is <b>the</b> store for awesome stuff of all kinds!", rating: 4 },
    FeedbackFixture {
        comment: "Never gonna buy anywhere else from now on! Thanks for the great service!",
        rating: 4,
    },
    FeedbackFixture { comment: "Keep up the good work!", rating: 3 },
];

pub const COMPLAINTS: [ComplaintFixture; 1] = [ComplaintFixture {
    author: "bender",
    message: "I'll build my own eCommerce business! With Black Jack! And Hookers!",
}];

pub const RECYCLES: [RecycleFixture; 9] = [
    RecycleFixture { owner: "jim", quantity: 800, date: "2270-01-17" },
    RecycleFixture { owner: "bender", quantity: 1320, date: "2006-01-14" },
    RecycleFixture { owner: "bjoernGoogle", quantity: 120, date: "2018-04-16" },
    RecycleFixture { owner: "admin", quantity: 300, date: "2018-01-17" },
    RecycleFixture { owner: "bjoernGoogle", quantity: 350, date: "2018-03-17" },
    RecycleFixture { owner: "bender", quantity: 200, date: "2018-07-17" },
    RecycleFixture { owner: "bjoernGoogle", quantity: 140, date: "2018-03-19" },
    RecycleFixture { owner: "admin", quantity: 150, date: "2018-05-12" },
    RecycleFixture { owner: "demo", quantity: 500, date: "2019-02-18" },
];

pub const ORDERS: [OrderFixture; 2] = [
    OrderFixture {
        owner: "admin",
        lines: &[
            OrderLineFixture { product_slot: 0, quantity: 3 },
            OrderLineFixture { product_slot: 1, quantity: 1 },
        ],
        state: "delivered",
    },
    OrderFixture {
        owner: "jim",
        lines: &[OrderLineFixture { product_slot: 2, quantity: 3 }],
        state: "processing",
    },
];

pub const FIXED_MEMORY: MemoryFixture = MemoryFixture {
    owner: "bjoernOwasp",
    image_path: "assets/public/images/uploads/ᓚᘏᗢ-#zatschi-#whoneedsfourlegs-1572600969477.jpg",
    caption: "😼 #zatschi #whoneedsfourlegs",
};

/// Owners of geo-stalking memories.
pub const GEO_STALKING_META_USER: &str = "john";
pub const GEO_STALKING_VISUAL_USER: &str = "emma";
