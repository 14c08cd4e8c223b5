//! The role catalog: every interaction point the flows touch, with its
//! ordered fallback chain. Chains reflect markup variants observed in the
//! wild; keep new variants here rather than inlining selectors in the flows.

use crate::selector::{RoleSpec, Strategy};

/// Terms accepted for the "advance to next step" control, matched
/// case-insensitively against aria-label and visible text.
pub const ADVANCE_TERMS: &[&str] = &["next", "continue", "proceed", "weiter", "fortfahren"];

/// Terms accepted for the final submission control.
pub const SUBMIT_TERMS: &[&str] = &[
    "submit application",
    "submit",
    "send application",
    "absenden",
    "bewerbung senden",
];

/// Result cards on a listing page.
pub fn listing_cards() -> RoleSpec {
    RoleSpec::new("listing card")
        .strategy("css:li.jobs-search-results__list-item")
        .strategy("css:div.job-card-container")
}

/// Badge marking a card as supporting the simplified flow. Full-text fallback
/// lives in the extractor, not here, because it is a containment check on the
/// card itself rather than a descendant lookup.
pub fn eligibility_badge(marker: &str) -> RoleSpec {
    RoleSpec::new("eligibility badge")
        .strategy("css:.job-card-container__apply-method--easy-apply")
        .strategy(Strategy::Text(marker.to_string()))
}

pub fn card_title() -> RoleSpec {
    RoleSpec::new("title field")
        .strategy("css:a.job-card-list__title")
        .strategy("css:h3.base-search-card__title")
        .strategy("css:.artdeco-entity-lockup__title")
}

pub fn card_organization() -> RoleSpec {
    RoleSpec::new("organization field")
        .strategy("css:.job-card-container__company-name")
        .strategy("css:h4.base-search-card__subtitle")
        .strategy("css:.artdeco-entity-lockup__subtitle")
}

pub fn card_location() -> RoleSpec {
    RoleSpec::new("location field")
        .strategy("css:.job-card-container__metadata-item")
        .strategy("css:.job-search-card__location")
}

/// Anchor carrying the listing's target URL in its `href`.
pub fn card_link() -> RoleSpec {
    RoleSpec::new("listing link")
        .strategy("css:a.job-card-list__title")
        .strategy("css:a.base-card__full-link")
}

/// Page-number controls at the foot of the results list. The walker
/// enumerates these directly; the current page carries an aria-current
/// equivalent attribute.
pub fn page_indicator_strategy() -> Strategy {
    Strategy::Css("li[data-test-pagination-page-btn] button".to_string())
}

/// Attribute flagging the active page indicator.
pub const CURRENT_PAGE_ATTR: &str = "aria-current";

/// The control that opens the application modal. Mandatory.
pub fn apply_control() -> RoleSpec {
    RoleSpec::new("apply control")
        .strategy("attr:data-control-name=jobdetails_topcard_inapply")
        .strategy("css:button.jobs-apply-button")
        .strategy("aria:easy apply")
}

/// Root of the application modal, resolved once after initiation and threaded
/// as the scope of every subsequent wizard step.
pub fn modal_root() -> RoleSpec {
    RoleSpec::new("application modal")
        .strategy("css:div.jobs-easy-apply-modal")
        .strategy("css:div[role='dialog']")
}

/// Optional confirmation control shown by some entry variants.
pub fn entry_confirm() -> RoleSpec {
    RoleSpec::new("entry confirm control")
        .strategy("attr:data-control-name=continue_unify")
        .strategy("aria:continue applying")
}

/// Exact-attribute pass of the layered advance resolution.
pub fn advance_exact() -> RoleSpec {
    RoleSpec::new("advance control (exact)")
        .strategy("attr:data-easy-apply-next-button=")
        .strategy("attr:data-control-name=continue_unify")
}

/// Semantic pass: aria-label then visible-text containment over the advance
/// vocabulary, scoped by the caller to the modal root.
pub fn advance_semantic() -> RoleSpec {
    let mut spec = RoleSpec::new("advance control (semantic)");
    for term in ADVANCE_TERMS {
        spec = spec.strategy(Strategy::AriaLabel((*term).to_string()));
    }
    for term in ADVANCE_TERMS {
        spec = spec.strategy(Strategy::Text((*term).to_string()));
    }
    spec
}

/// A selectable document option inside the document step.
pub fn document_option() -> RoleSpec {
    RoleSpec::new("document option")
        .strategy("css:.jobs-document-upload-redesign-card__container")
        .strategy("css:label.jobs-document-upload__label")
}

/// A document option already marked active; presence means the step needs no
/// interaction.
pub fn document_selected() -> RoleSpec {
    RoleSpec::new("active document option")
        .strategy("css:.jobs-document-upload-redesign-card__container--selected")
        .strategy("css:input[type='radio']:checked")
}

/// Optional review-step trigger.
pub fn review_control() -> RoleSpec {
    RoleSpec::new("review control")
        .strategy("attr:data-easy-apply-review-button=")
        .strategy("aria:review your application")
}

/// The final submission control.
pub fn submit_exact() -> RoleSpec {
    RoleSpec::new("submit control (exact)")
        .strategy("attr:data-easy-apply-submit-button=")
        .strategy("attr:data-control-name=submit_unify")
}

pub fn submit_semantic() -> RoleSpec {
    let mut spec = RoleSpec::new("submit control (semantic)");
    for term in SUBMIT_TERMS {
        spec = spec.strategy(Strategy::AriaLabel((*term).to_string()));
    }
    for term in SUBMIT_TERMS {
        spec = spec.strategy(Strategy::Text((*term).to_string()));
    }
    spec
}

pub fn signin_username() -> RoleSpec {
    RoleSpec::new("sign-in username field")
        .strategy("css:input#username")
        .strategy("css:input[name='session_key']")
}

pub fn signin_password() -> RoleSpec {
    RoleSpec::new("sign-in password field")
        .strategy("css:input#password")
        .strategy("css:input[name='session_password']")
}

pub fn signin_submit() -> RoleSpec {
    RoleSpec::new("sign-in submit control")
        .strategy("css:button[type='submit']")
        .strategy("aria:sign in")
}
