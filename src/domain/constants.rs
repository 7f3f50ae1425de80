//! Shop and catalog domain constants
//!
//! Fixed characteristics of the PrestaShop webservice and of the scraped
//! source catalog that the import passes rely on.

/// PrestaShop webservice characteristics
pub mod shop {
    /// Root (1) and Home (2) belong to the shop itself and are never deleted.
    pub const PROTECTED_CATEGORY_MAX_ID: u64 = 2;

    /// Root element of every webservice document.
    pub const DOCUMENT_ROOT: &str = "prestashop";

    /// Namespace declared on outgoing documents.
    pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

    /// Fragments of a PHP notice PrestaShop emits on some successful creates.
    /// The response is still a valid document when both fragments are present.
    pub const BENIGN_NOTICE_MARKERS: [&str; 2] = [
        "PHP Notice #8",
        "Trying to access array offset on value of type bool",
    ];
}

/// Source catalog characteristics
pub mod catalog {
    /// Separator between segments of a full category path ("Zabawki/Klocki").
    pub const CATEGORY_PATH_SEPARATOR: char = '/';

    /// Image file names inside a product's image directory, in upload order.
    /// The main image stands alone; the numbered ones stop at the first gap.
    pub const IMAGE_FILE_NAMES: [&str; 4] = [
        "product.jpg",
        "product_2.jpg",
        "product_3.jpg",
        "product_4.jpg",
    ];

    /// Heading placed above the attribute list in product descriptions.
    pub const ATTRIBUTES_HEADING: &str = "Szczegóły produktu:";
}
