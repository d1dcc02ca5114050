//! CSS selectors for the directory's page layout

// ===== Navigation =====

/// Main category links on the home page
pub const HOME_CATEGORY_LINK: &str = ".p-2.ps-1 a.text-dark";

/// Subcategory links on a main category page
pub const SUBCATEGORY_LINK: &str = ".col-sm-6.p-4.pe-3.pt-0.pb-2 a";

// ===== Listing pages =====

/// Block wrapping the listing items of a page
pub const LISTING_BLOCK: &str = ".div_listing";

/// One listing item
pub const LISTING_ITEM: &str = ".rounded-4.border.bg-white.shadow-sm.mb-3.pb-4";

/// Company name link inside a listing item
pub const LISTING_LINK: &str = ".yp_noidunglistings .fs-5.pb-0.text-capitalize a";

/// Rank shown next to a listing item
pub const LISTING_ORDER: &str = ".yp_sothutu .yp_sothutu_txt small";

/// Pagination links
pub const PAGING_LINK: &str = "#paging a";

/// Visible text of the "next page" pagination control
pub const NEXT_LABEL: &str = "Tiếp";

// ===== Detail pages =====

pub const DETAIL_NAME: &str = ".fs-3.text-capitalize";

/// Address, phone and email rows, in that order
pub const DETAIL_INFO_ROW: &str = ".m-0.pb-2";

/// Phone numbers inside the phone row; the second one is the hotline
pub const DETAIL_PHONE: &str = ".fw-semibold.fs18";

pub const DETAIL_WEBSITE: &str = ".m-0.fs18";

/// Section headings; the introduction follows the one titled
/// [`INTRO_HEADING_TEXT`]
pub const DETAIL_SECTION_HEADING: &str = ".yp_h2_border";

pub const INTRO_HEADING_TEXT: &str = "giới thiệu công ty";

pub const DETAIL_BUSINESS: &str = ".yp_div_nganh_thitruong";

pub const DETAIL_PRODUCTS: [&str; 2] = [".yp_div_sanphamdichvu1", ".yp_div_sanphamdichvu2"];
