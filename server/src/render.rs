//! Book detail page.
//!
//! Uses [maud](https://maud.lambda.xyz/) so every submitted field is
//! escaped for the context it lands in. The page is a pure function of the
//! [`Book`]; stylesheet and script URLs are fixed.

use crate::models::Book;
use maud::{html, Markup, PreEscaped, DOCTYPE};

const SITE_TITLE: &str = "THE MULTIMEDIA STORE";
const BOOTSTRAP_CSS: &str = "https://stackpath.bootstrapcdn.com/bootstrap/4.5.0/css/bootstrap.min.css";
const BOOTSTRAP_CSS_SRI: &str =
    "sha384-9aIt2nRpC12Uk9gS9baDl411NQApFmC26EwAOH8WgZl5MYYxFfc+NcPb1dKGj7Sk";
const FONT_CSS: &str = "https://fonts.googleapis.com/css2?family=Nanum+Myeongjo&display=swap";
const ICON_CSS: &str = "/icons/font/flaticon.css";
const JQUERY_JS: &str = "https://code.jquery.com/jquery-3.5.1.slim.min.js";
const POPPER_JS: &str = "https://cdn.jsdelivr.net/npm/@popperjs/core@2.5.3/dist/umd/popper.min.js";
const BOOTSTRAP_JS: &str = "https://stackpath.bootstrapcdn.com/bootstrap/4.5.0/js/bootstrap.min.js";
const VIDEO_ALLOW: &str = "accelerometer; autoplay; encrypted-media; gyroscope; picture-in-picture";

const PAGE_CSS: &str = r#"
        .jumbotron {
            background-image: url("https://images.unsplash.com/photo-1532012197267-da84d127e765?q=80&w=1974&auto=format&fit=crop");
            color: floralwhite;
            background-size: cover;
        }
        #header { font-family: 'Nanum Myeongjo', serif; }
        .lead-line { text-align: center; font-size: 1.25rem; font-weight: bold; }
        .image { opacity: 1; display: block; width: 100%; height: auto; transition: .5s ease; }
        iframe { padding: 1em; }
        #iframe_container { margin-top: 2em; display: flex; justify-content: center; }
        .read-btn {
            display: block;
            width: 200px;
            margin: 20px auto;
            padding: 10px 20px;
            background-color: #007bff;
            color: white;
            text-align: center;
            text-decoration: none;
            border-radius: 5px;
            transition: background-color 0.3s ease;
        }
        .read-btn:hover { background-color: #0056b3; color: white; text-decoration: none; }
        .navbar { background-color: rgba(0,0,0,0.7); font-family: 'Nanum Myeongjo', serif; }
        .navbar-brand, .navbar-nav .nav-link { color: floralwhite !important; }
"#;

/// Renders the full HTML document for `book`.
pub fn book_page(book: &Book) -> String {
    base_document(
        html! {
            (site_nav())
            (site_banner())
            div class="container" {
                (cover(book))
                (details_table(book))
                (summary(&book.book_summary))
                (video(&book.youtube_link))
            }
            (site_footer())
        },
    )
    .into_string()
}

fn base_document(content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                link rel="stylesheet" href=(BOOTSTRAP_CSS) integrity=(BOOTSTRAP_CSS_SRI) crossorigin="anonymous";
                link href=(FONT_CSS) rel="stylesheet";
                link rel="stylesheet" type="text/css" href=(ICON_CSS);
                title { "Browsing page" }
                style type="text/css" { (PreEscaped(PAGE_CSS)) }
            }
            body {
                (content)
                script src=(JQUERY_JS) {}
                script src=(POPPER_JS) {}
                script src=(BOOTSTRAP_JS) {}
            }
        }
    }
}

fn site_nav() -> Markup {
    html! {
        nav class="navbar navbar-expand-lg navbar-dark" {
            a class="navbar-brand" href="/" { (SITE_TITLE) }
            button class="navbar-toggler" type="button" data-toggle="collapse" data-target="#navbarNav" {
                span class="navbar-toggler-icon" {}
            }
            div class="collapse navbar-collapse" id="navbarNav" {
                ul class="navbar-nav ml-auto" {
                    li class="nav-item" { a class="nav-link" href="/index.html" { "Home" } }
                    li class="nav-item" { a class="nav-link" href="/contact.html" { "Contact" } }
                    li class="nav-item" { a class="nav-link" href="/about.html" { "About me" } }
                }
            }
        }
    }
}

fn site_banner() -> Markup {
    html! {
        div class="jumbotron" {
            div id="header" {
                h1 class="display-3" style="text-align:center;" { strong { (SITE_TITLE) } }
                div class="lead-line" {
                    "Unlock the power of multimedia: innovation, quality, and creativity in one place!"
                }
            }
        }
    }
}

fn cover(book: &Book) -> Markup {
    let image_src = (!book.book_image.is_empty()).then_some(book.book_image.as_str());
    html! {
        div class="text-center" {
            h3 class="my-5" { (book.book_name) }
            img src=[image_src] class="rounded mb-5" alt=(format!("{} Book Cover", book.book_name));
            @if !book.book_link.is_empty() {
                a href=(book.book_link) target="_blank" class="read-btn" { "Read Book" }
            }
        }
    }
}

fn details_table(book: &Book) -> Markup {
    let rows = [
        ("Birth/Death", format!("{} - {}", book.birth_year, book.death_year)),
        ("Language", book.language.clone()),
        ("Genre", book.genre.clone()),
        ("Literary Movement", book.literary_movement.clone()),
        ("Important Themes", book.important_themes.clone()),
        ("Key Characters", book.key_characters.clone()),
    ];
    html! {
        table class="table" {
            thead {
                tr {
                    th scope="col" { "Author" }
                    td { (book.author_name) }
                }
            }
            tbody {
                @for (label, value) in &rows {
                    tr {
                        th scope="row" { (label) }
                        td { (value) }
                    }
                }
            }
        }
    }
}

/// One paragraph per line of the summary, blank lines included.
fn summary(text: &str) -> Markup {
    html! {
        div class="book-summary" {
            @for paragraph in text.split('\n') {
                p { (paragraph) }
            }
        }
    }
}

fn video(link: &str) -> Markup {
    html! {
        div id="iframe_container" {
            iframe width="560" height="315" src=(link) frameborder="0" allow=(VIDEO_ALLOW) allowfullscreen {}
        }
    }
}

fn site_footer() -> Markup {
    html! {
        hr;
        div class="container" {
            footer class="page-footer font-small pt-4" {
                div class="footer-copyright text-center py-3" { "© 2025 " (SITE_TITLE) "." }
            }
        }
    }
}
