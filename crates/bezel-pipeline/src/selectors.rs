//! DOM anchors for the EveryWatch marketplace.
//!
//! Everything site-shaped lives here so a front-end change is a
//! one-file fix.

/// Search box on the marketplace home page.
pub const HOME_SEARCH_INPUT: &str = r#"input[placeholder*="Search over"]"#;

/// Embedded anti-bot challenge frame.
pub const CHALLENGE_FRAME: &str = r#"iframe[title="reCAPTCHA"]"#;

/// Phrase shown on the interstitial page when content is gated.
pub const GATED_CONTENT_PHRASE: &str = "only collectors beyond this point";

/// Markers that appear once real content is visible again after a
/// challenge: either a price on a listing page or the result-view tabs
/// on a search page.
pub const POST_CHALLENGE_MARKERS: &[&str] = &[".price", ".ew-tab-option"];

/// One option in the result-view dropdown.
pub const VIEW_OPTION: &str = ".ew-tab-option";
/// Label text inside a view option.
pub const VIEW_OPTION_LABEL: &str = ".ew-tab-option-label";
/// Result count inside a view option.
pub const VIEW_OPTION_COUNT: &str = ".ew-tab-option-count";
/// Label of the currently selected view.
pub const ACTIVE_VIEW_LABEL: &str = ".ew-select-dropdown__single-value .ew-tab-option-label";
/// Clickable control that opens the view dropdown.
pub const VIEW_DROPDOWN_CONTROL: &str = ".ew-select-dropdown__control";

/// One listing card on a search-result page.
pub const LISTING_CARD: &str = "a.ew-grid-item.ew-grid-watch-card";
/// Last-seen date on a historical card.
pub const CARD_LAST_SEEN: &str = ".last-seen";
/// Days-on-market counter on an available card.
pub const CARD_DAYS_LISTED: &str = ".days-on-market b";
/// Source marketplace badge; its `title` attribute names the venue.
pub const CARD_SOURCE: &str = ".location-date-details .location";

/// One labeled detail row on a listing page.
pub const DETAIL_ITEM: &str = ".awd-desc-items";
/// Label of a detail row.
pub const DETAIL_TITLE: &str = ".awd-title";
/// Plain value of a detail row.
pub const DETAIL_VALUE: &str = ".awd-detail";
/// Linked value of a detail row (seller, source).
pub const DETAIL_VALUE_LINK: &str = ".awd-detail a";

/// One block in the price-analysis strip.
pub const PRICE_ITEM: &str = ".price-analysis-item";
/// Label of a price-analysis block.
pub const PRICE_ITEM_TITLE: &str = ".title-wrapper";
/// Value of a price-analysis block.
pub const PRICE_ITEM_VALUE: &str = ".price";
/// First price shown anywhere in the analysis strip.
pub const FIRST_PRICE: &str = ".price-analysis-item .price";

/// Listing heading; its trailing link carries the reference number.
pub const HEADING_LINKS: &str = "h1.flex-wrap a";
/// Brand name above the heading.
pub const BRAND: &str = ".brand span";
/// Lot-detail rows; the second one is the model line.
pub const LOT_DETAIL_ROWS: &str = ".lot-detail div";
/// Main gallery image.
pub const GALLERY_IMAGE: &str = ".swiper-slide img";

/// Markers that mean a listing page has rendered its details.
pub const LISTING_MARKERS: &[&str] = &[".price", ".awd-desc-items"];

/// Only listings relayed from this venue are harvested.
pub const SOURCE_MARKETPLACE: &str = "Chrono24";

/// Installed on every document load. Removes the paywall overlay and the
/// popular-section banner, and keeps the body scrollable; the site
/// re-adds both, so it runs on an interval.
pub const POPUP_KILLER: &str = r"(() => {
    const kill = () => {
        const paywall = document.querySelector('div.general-popup-outer.ew-paywall-outer');
        if (paywall) paywall.remove();
        const popular = document.querySelector('div.ew-popular-section');
        if (popular) popular.remove();
        const body = document.body;
        if (body) {
            body.style.overflow = 'auto';
            body.classList.remove('overflow-hidden');
            body.classList.add('overflow-auto');
        }
    };
    kill();
    setInterval(kill, 300);
})();";
