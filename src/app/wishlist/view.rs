//! Wishlist 页面渲染

use super::model::Product;
use crate::core::response::{escape_html as e, prefixed};
use crate::core::session::Flash;

fn layout(prefix: &str, title: &str, flashes: &[Flash], body: &str) -> String {
    let notices: String = flashes
        .iter()
        .map(|flash| {
            format!(
                "<div class=\"flash flash-{}\">{}</div>\n",
                flash.level.as_str(),
                e(&flash.message)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{css}">
</head>
<body>
<header>
<nav><a href="{home}">Wishlist</a> <a href="{admin}">Admin</a></nav>
</header>
<main>
{notices}{body}
</main>
</body>
</html>
"#,
        title = e(title),
        css = e(&prefixed(prefix, "/static/style.css")),
        home = e(&prefixed(prefix, "/")),
        admin = e(&prefixed(prefix, "/admin")),
    )
}

fn post_button(action: &str, label: &str, class: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{}\" class=\"inline\"><button type=\"submit\" class=\"{}\">{}</button></form>",
        e(action),
        class,
        e(label)
    )
}

fn price_line(product: &Product) -> String {
    let Some(price) = &product.price else {
        return String::new();
    };
    let checked = product
        .price_checked_at
        .map(|at| format!(" <small>(checked {})</small>", at.format("%d %b %Y")))
        .unwrap_or_default();
    format!("<p class=\"price\">{}{}</p>", e(price), checked)
}

fn title_html(product: &Product) -> String {
    if product.link.is_empty() {
        e(&product.name)
    } else {
        format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
            e(&product.link),
            e(&product.name)
        )
    }
}

fn status_badge(product: &Product) -> &'static str {
    if product.purchased {
        "<span class=\"badge purchased\">Purchased</span>"
    } else if product.reserved {
        "<span class=\"badge reserved\">Reserved</span>"
    } else {
        ""
    }
}

/// 公开的商品列表
pub fn index_page(prefix: &str, products: &[Product], flashes: &[Flash]) -> String {
    let mut body = String::from("<h1>Our Wishlist</h1>\n");

    if products.is_empty() {
        body.push_str("<p>Nothing on the list yet.</p>\n");
    }

    body.push_str("<div class=\"grid\">\n");
    for product in products {
        let image = if product.image.is_empty() {
            String::new()
        } else {
            format!(
                "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                e(&product.image),
                e(&product.name)
            )
        };
        let retailer = product
            .retailer
            .as_deref()
            .map(|r| format!("<p class=\"retailer\">{}</p>", e(r)))
            .unwrap_or_default();

        let actions = if product.purchased {
            String::new()
        } else {
            let mut actions = post_button(
                &prefixed(prefix, &format!("/mark/{}", product.id)),
                "Mark as purchased",
                "primary",
            );
            if !product.reserved {
                actions.push_str(&post_button(
                    &prefixed(prefix, &format!("/reserve/{}", product.id)),
                    "Reserve",
                    "secondary",
                ));
            }
            actions
        };

        let class = if product.purchased { "card done" } else { "card" };
        body.push_str(&format!(
            "<article class=\"{class}\">{image}<h2>{title}</h2>{retailer}{price}{badge}<div class=\"actions\">{actions}</div></article>\n",
            title = title_html(product),
            price = price_line(product),
            badge = status_badge(product),
        ));
    }
    body.push_str("</div>\n");

    layout(prefix, "Wishlist", flashes, &body)
}

fn login_form(prefix: &str) -> String {
    format!(
        r#"<h1>Admin</h1>
<form method="post" action="{action}" class="login">
<label>Username <input type="text" name="username" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="current-password" required></label>
<button type="submit" name="login" value="1" class="primary">Log in</button>
</form>
"#,
        action = e(&prefixed(prefix, "/admin")),
    )
}

/// 添加或编辑商品的表单字段
fn product_fields(product: Option<&Product>) -> String {
    let (name, link, image, price, retailer) = match product {
        Some(p) => (
            e(&p.name),
            e(&p.link),
            e(&p.image),
            e(p.price.as_deref().unwrap_or("")),
            e(p.retailer.as_deref().unwrap_or("")),
        ),
        None => Default::default(),
    };
    format!(
        r#"<label>Name <input type="text" name="name" value="{name}" required></label>
<label>Link <input type="url" name="link" value="{link}"></label>
<label>Image <input type="url" name="image" value="{image}"></label>
<label>Price <input type="text" name="price" value="{price}"></label>
<label>Retailer <input type="text" name="retailer" value="{retailer}" placeholder="guessed from link"></label>
<label class="check"><input type="checkbox" name="fetch_price" value="1"> Look up price from link</label>
"#,
    )
}

fn admin_row(prefix: &str, product: &Product) -> String {
    let status = match (product.purchased, product.reserved) {
        (true, _) => {
            let at = product
                .purchased_at
                .map(|at| at.format(" on %d %b %Y").to_string())
                .unwrap_or_default();
            format!("Purchased{at}")
        }
        (false, true) => "Reserved".to_string(),
        (false, false) => "Available".to_string(),
    };

    let mut actions = post_button(
        &prefixed(prefix, &format!("/refresh-price/{}", product.id)),
        "Refresh price",
        "secondary",
    );
    if product.purchased || product.reserved {
        actions.push_str(&post_button(
            &prefixed(prefix, &format!("/clear/{}", product.id)),
            "Clear status",
            "secondary",
        ));
    }
    actions.push_str(&post_button(
        &prefixed(prefix, &format!("/delete/{}", product.id)),
        "Delete",
        "danger",
    ));

    format!(
        r#"<section class="item">
<h3>{title}</h3>
<p>{retailer} {status}</p>
{price}<details><summary>Edit</summary>
<form method="post" action="{action}">
<input type="hidden" name="edit_id" value="{id}">
{fields}<button type="submit" class="primary">Save</button>
</form>
</details>
<div class="actions">{actions}</div>
</section>
"#,
        title = title_html(product),
        retailer = e(product.retailer.as_deref().unwrap_or("")),
        status = e(&status),
        price = price_line(product),
        action = e(&prefixed(prefix, "/admin")),
        id = e(&product.id),
        fields = product_fields(Some(product)),
    )
}

/// 管理页面；未登录时只显示登录表单
pub fn admin_page(prefix: &str, products: &[Product], flashes: &[Flash], logged_in: bool) -> String {
    if !logged_in {
        return layout(prefix, "Admin", flashes, &login_form(prefix));
    }

    let admin_url = e(&prefixed(prefix, "/admin"));
    let mut body = format!(
        r#"<h1>Manage wishlist</h1>
<form method="post" action="{admin_url}" class="inline"><button type="submit" name="logout" value="1">Log out</button></form>
<h2>Add a product</h2>
<form method="post" action="{admin_url}" class="add">
{fields}<button type="submit" class="primary">Add</button>
</form>
<h2>Products ({count})</h2>
"#,
        fields = product_fields(None),
        count = products.len(),
    );

    for product in products {
        body.push_str(&admin_row(prefix, product));
    }

    layout(prefix, "Admin", flashes, &body)
}
