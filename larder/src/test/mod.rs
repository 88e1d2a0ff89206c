//! End-to-end API tests: the full router over a real database.

use crate::test_utils::*;
use serde_json::{Value, json};
use sqlx::PgPool;

/// The session cookie pair from a Set-Cookie response header
fn cookie_from_response(response: &axum_test::TestResponse) -> String {
    let set_cookie = response.header("set-cookie");
    let set_cookie = set_cookie.to_str().expect("set-cookie should be a string");
    set_cookie.split(';').next().expect("cookie pair").to_string()
}

#[sqlx::test]
#[test_log::test]
async fn test_healthz(pool: PgPool) {
    let server = create_test_app(pool).await;

    let response = server.get("/healthz").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

#[sqlx::test]
#[test_log::test]
async fn test_register_login_me_flow(pool: PgPool) {
    let server = create_test_app(pool).await;

    // Register a new account; the response sets a session cookie
    let register = server
        .post("/authentication/register")
        .json(&json!({
            "email": "cook@example.com",
            "username": "cook",
            "first_name": "Julia",
            "last_name": "Child",
            "password": "a-long-enough-password"
        }))
        .await;
    assert_eq!(register.status_code().as_u16(), 201);
    let registered: Value = register.json();
    assert_eq!(registered["user"]["email"], "cook@example.com");

    // Duplicate email is a conflict, courtesy of the unique index
    let duplicate = server
        .post("/authentication/register")
        .json(&json!({
            "email": "cook@example.com",
            "username": "cook2",
            "first_name": "J",
            "last_name": "C",
            "password": "a-long-enough-password"
        }))
        .await;
    assert_eq!(duplicate.status_code().as_u16(), 409);

    // A too-short password is a validation failure
    let short = server
        .post("/authentication/register")
        .json(&json!({
            "email": "short@example.com",
            "username": "short",
            "first_name": "S",
            "last_name": "P",
            "password": "nope"
        }))
        .await;
    assert_eq!(short.status_code().as_u16(), 400);

    // Wrong password does not log in
    let bad_login = server
        .post("/authentication/login")
        .json(&json!({ "email": "cook@example.com", "password": "wrong" }))
        .await;
    assert_eq!(bad_login.status_code().as_u16(), 401);

    // Correct password does
    let login = server
        .post("/authentication/login")
        .json(&json!({ "email": "cook@example.com", "password": "a-long-enough-password" }))
        .await;
    login.assert_status_ok();
    let cookie = cookie_from_response(&login);

    // The session resolves the current user
    let me = server.get("/api/v1/users/me").add_header("cookie", cookie.clone()).await;
    me.assert_status_ok();
    let me: Value = me.json();
    assert_eq!(me["username"], "cook");

    // Without a session, /me is unauthorized
    let anonymous = server.get("/api/v1/users/me").await;
    assert_eq!(anonymous.status_code().as_u16(), 401);

    // Password change requires the current password
    let rejected = server
        .post("/authentication/password-change")
        .add_header("cookie", cookie.clone())
        .json(&json!({ "current_password": "wrong", "new_password": "an-even-longer-password" }))
        .await;
    assert_eq!(rejected.status_code().as_u16(), 401);

    let changed = server
        .post("/authentication/password-change")
        .add_header("cookie", cookie)
        .json(&json!({ "current_password": "a-long-enough-password", "new_password": "an-even-longer-password" }))
        .await;
    changed.assert_status_ok();

    // The old password no longer works, the new one does
    let old_login = server
        .post("/authentication/login")
        .json(&json!({ "email": "cook@example.com", "password": "a-long-enough-password" }))
        .await;
    assert_eq!(old_login.status_code().as_u16(), 401);
    let new_login = server
        .post("/authentication/login")
        .json(&json!({ "email": "cook@example.com", "password": "an-even-longer-password" }))
        .await;
    new_login.assert_status_ok();
}

#[sqlx::test]
#[test_log::test]
async fn test_recipe_crud_and_permissions(pool: PgPool) {
    let author = create_test_user(&pool, "author@example.com", "author").await;
    let stranger = create_test_user(&pool, "stranger@example.com", "stranger").await;
    let admin = create_test_admin_user(&pool, "boss@example.com", "boss").await;
    let tag = create_test_tag(&pool, "breakfast", "#FFAA00", "breakfast").await;
    let other_tag = create_test_tag(&pool, "dinner", "#0055FF", "dinner").await;
    let flour = create_test_ingredient(&pool, "flour", "g").await;
    let milk = create_test_ingredient(&pool, "milk", "ml").await;

    let server = create_test_app(pool).await;
    let author_cookie = session_cookie_for(&author);
    let stranger_cookie = session_cookie_for(&stranger);
    let admin_cookie = session_cookie_for(&admin);

    // Anonymous creation is rejected
    let anonymous = server
        .post("/api/v1/recipes")
        .json(&json!({
            "name": "Pancakes", "text": "Mix and fry.", "cooking_time": 20,
            "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 200 }]
        }))
        .await;
    assert_eq!(anonymous.status_code().as_u16(), 401);

    // Author creates the recipe, image inlined as a base64 data URL
    let pixel = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
    let created = server
        .post("/api/v1/recipes")
        .add_header("cookie", author_cookie.clone())
        .json(&json!({
            "name": "Pancakes", "text": "Mix and fry.", "cooking_time": 20,
            "image": format!("data:image/png;base64,{pixel}"),
            "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 200 }]
        }))
        .await;
    assert_eq!(created.status_code().as_u16(), 201);
    let created: Value = created.json();
    let recipe_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["author"]["username"], "author");
    assert_eq!(created["tags"][0]["slug"], "breakfast");
    assert_eq!(created["ingredients"][0]["name"], "flour");
    assert_eq!(created["ingredients"][0]["amount"], 200);
    // The decoded image landed under the media root
    let image_path = created["image"].as_str().unwrap();
    assert!(image_path.starts_with("recipes/") && image_path.ends_with(".png"));

    // A stranger may read but not update
    let forbidden = server
        .patch(&format!("/api/v1/recipes/{recipe_id}"))
        .add_header("cookie", stranger_cookie.clone())
        .json(&json!({
            "name": "Hijacked", "text": "Mine now.", "cooking_time": 1,
            "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 1 }]
        }))
        .await;
    assert_eq!(forbidden.status_code().as_u16(), 403);

    // The author's update fully replaces both association sets
    let updated = server
        .patch(&format!("/api/v1/recipes/{recipe_id}"))
        .add_header("cookie", author_cookie.clone())
        .json(&json!({
            "name": "Crepes", "text": "Mix thinner and fry.", "cooking_time": 15,
            "tags": [other_tag.id], "ingredients": [{ "id": milk.id, "amount": 300 }]
        }))
        .await;
    updated.assert_status_ok();
    let updated: Value = updated.json();
    assert_eq!(updated["name"], "Crepes");
    assert_eq!(updated["tags"].as_array().unwrap().len(), 1);
    assert_eq!(updated["tags"][0]["slug"], "dinner");
    assert_eq!(updated["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(updated["ingredients"][0]["name"], "milk");

    // Listing filters by author and by tag slug
    let by_tag = server.get("/api/v1/recipes?tags=dinner").await;
    by_tag.assert_status_ok();
    assert_eq!(by_tag.json::<Value>().as_array().unwrap().len(), 1);
    let none_by_tag = server.get("/api/v1/recipes?tags=breakfast").await;
    assert_eq!(none_by_tag.json::<Value>().as_array().unwrap().len(), 0);

    // An admin may delete someone else's recipe
    let deleted = server
        .delete(&format!("/api/v1/recipes/{recipe_id}"))
        .add_header("cookie", admin_cookie)
        .await;
    assert_eq!(deleted.status_code().as_u16(), 204);

    let gone = server.get(&format!("/api/v1/recipes/{recipe_id}")).await;
    assert_eq!(gone.status_code().as_u16(), 404);
}

#[sqlx::test]
#[test_log::test]
async fn test_recipe_validation_pipeline(pool: PgPool) {
    let author = create_test_user(&pool, "val@example.com", "val").await;
    let tag = create_test_tag(&pool, "snack", "#123456", "snack").await;
    let flour = create_test_ingredient(&pool, "flour", "g").await;

    let server = create_test_app(pool).await;
    let cookie = session_cookie_for(&author);

    // Empty tags
    let response = server
        .post("/api/v1/recipes")
        .add_header("cookie", cookie.clone())
        .json(&json!({
            "name": "A", "text": "B", "cooking_time": 5,
            "tags": [], "ingredients": [{ "id": flour.id, "amount": 1 }]
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
    assert_eq!(response.json::<Value>()["field"], "tags");

    // Duplicate ingredient ids
    let response = server
        .post("/api/v1/recipes")
        .add_header("cookie", cookie.clone())
        .json(&json!({
            "name": "A", "text": "B", "cooking_time": 5,
            "tags": [tag.id],
            "ingredients": [{ "id": flour.id, "amount": 1 }, { "id": flour.id, "amount": 2 }]
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
    assert_eq!(response.json::<Value>()["field"], "ingredients");

    // Non-positive amount
    let response = server
        .post("/api/v1/recipes")
        .add_header("cookie", cookie.clone())
        .json(&json!({
            "name": "A", "text": "B", "cooking_time": 5,
            "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 0 }]
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
    assert_eq!(response.json::<Value>()["field"], "amount");

    // Non-positive cooking time
    let response = server
        .post("/api/v1/recipes")
        .add_header("cookie", cookie.clone())
        .json(&json!({
            "name": "A", "text": "B", "cooking_time": 0,
            "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 1 }]
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
    assert_eq!(response.json::<Value>()["field"], "cooking_time");

    // Duplicate (name, text) submission
    let first = server
        .post("/api/v1/recipes")
        .add_header("cookie", cookie.clone())
        .json(&json!({
            "name": "Toast", "text": "Toast it.", "cooking_time": 3,
            "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 1 }]
        }))
        .await;
    assert_eq!(first.status_code().as_u16(), 201);

    let duplicate = server
        .post("/api/v1/recipes")
        .add_header("cookie", cookie)
        .json(&json!({
            "name": "Toast", "text": "Toast it.", "cooking_time": 3,
            "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 1 }]
        }))
        .await;
    assert_eq!(duplicate.status_code().as_u16(), 400);
}

#[sqlx::test]
#[test_log::test]
async fn test_favorite_and_cart_toggle_contract(pool: PgPool) {
    let author = create_test_user(&pool, "toggler@example.com", "toggler").await;
    let tag = create_test_tag(&pool, "lunch", "#445566", "lunch").await;
    let flour = create_test_ingredient(&pool, "flour", "g").await;

    let server = create_test_app(pool).await;
    let cookie = session_cookie_for(&author);

    let created = server
        .post("/api/v1/recipes")
        .add_header("cookie", cookie.clone())
        .json(&json!({
            "name": "Flatbread", "text": "Flat.", "cooking_time": 10,
            "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 100 }]
        }))
        .await;
    let recipe_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    for relation in ["favorite", "shopping-cart"] {
        let path = format!("/api/v1/recipes/{recipe_id}/{relation}");

        // First add succeeds and returns the recipe summary
        let added = server.post(&path).add_header("cookie", cookie.clone()).await;
        assert_eq!(added.status_code().as_u16(), 201, "{relation}");
        assert_eq!(added.json::<Value>()["name"], "Flatbread");

        // Second add is a conflict, not a silent no-op
        let again = server.post(&path).add_header("cookie", cookie.clone()).await;
        assert_eq!(again.status_code().as_u16(), 409, "{relation}");

        // First remove succeeds
        let removed = server.delete(&path).add_header("cookie", cookie.clone()).await;
        assert_eq!(removed.status_code().as_u16(), 204, "{relation}");

        // Second remove is not found
        let again = server.delete(&path).add_header("cookie", cookie.clone()).await;
        assert_eq!(again.status_code().as_u16(), 404, "{relation}");
    }

    // Toggling a nonexistent recipe is 404
    let missing = server
        .post(&format!("/api/v1/recipes/{}/favorite", uuid::Uuid::new_v4()))
        .add_header("cookie", cookie)
        .await;
    assert_eq!(missing.status_code().as_u16(), 404);
}

#[sqlx::test]
#[test_log::test]
async fn test_shopping_list_download(pool: PgPool) {
    let author = create_test_user(&pool, "shopper@example.com", "shopper").await;
    let tag = create_test_tag(&pool, "bake", "#998877", "bake").await;
    let flour = create_test_ingredient(&pool, "flour", "g").await;
    let sugar = create_test_ingredient(&pool, "sugar", "g").await;

    let server = create_test_app(pool).await;
    let cookie = session_cookie_for(&author);

    // Empty cart still downloads: header line only
    let empty = server.get("/api/v1/recipes/download-shopping-cart").add_header("cookie", cookie.clone()).await;
    empty.assert_status_ok();
    assert_eq!(empty.text(), "Shopping list:\n");

    // Two recipes sharing flour
    for (name, ingredients) in [
        ("Pancakes", json!([{ "id": flour.id, "amount": 200 }, { "id": sugar.id, "amount": 50 }])),
        ("Bread", json!([{ "id": flour.id, "amount": 100 }])),
    ] {
        let created = server
            .post("/api/v1/recipes")
            .add_header("cookie", cookie.clone())
            .json(&json!({
                "name": name, "text": format!("Make {name}."), "cooking_time": 30,
                "tags": [tag.id], "ingredients": ingredients
            }))
            .await;
        let recipe_id = created.json::<Value>()["id"].as_str().unwrap().to_string();
        let carted = server
            .post(&format!("/api/v1/recipes/{recipe_id}/shopping-cart"))
            .add_header("cookie", cookie.clone())
            .await;
        assert_eq!(carted.status_code().as_u16(), 201);
    }

    let download = server.get("/api/v1/recipes/download-shopping-cart").add_header("cookie", cookie).await;
    download.assert_status_ok();
    assert_eq!(
        download.header("content-disposition").to_str().unwrap(),
        "attachment; filename=\"shopping_cart.txt\""
    );
    // Amounts are summed per (name, unit), sorted by name
    assert_eq!(download.text(), "Shopping list:\n\nflour - 300, g\nsugar - 50, g");
}

#[sqlx::test]
#[test_log::test]
async fn test_subscription_flow(pool: PgPool) {
    let reader = create_test_user(&pool, "reader@example.com", "reader").await;
    let author = create_test_user(&pool, "writer@example.com", "writer").await;
    let tag = create_test_tag(&pool, "soup", "#334455", "soup").await;
    let flour = create_test_ingredient(&pool, "flour", "g").await;

    let server = create_test_app(pool).await;
    let reader_cookie = session_cookie_for(&reader);
    let author_cookie = session_cookie_for(&author);

    // The author publishes two recipes
    for name in ["Borscht", "Minestrone"] {
        let created = server
            .post("/api/v1/recipes")
            .add_header("cookie", author_cookie.clone())
            .json(&json!({
                "name": name, "text": format!("Cook {name}."), "cooking_time": 60,
                "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 10 }]
            }))
            .await;
        assert_eq!(created.status_code().as_u16(), 201);
    }

    // Self-subscription is always a validation error
    let selfie = server
        .post(&format!("/api/v1/users/{}/subscribe", reader.id))
        .add_header("cookie", reader_cookie.clone())
        .await;
    assert_eq!(selfie.status_code().as_u16(), 400);

    // Subscribe returns the author summary with count and previews
    let subscribed = server
        .post(&format!("/api/v1/users/{}/subscribe?recipes_limit=1", author.id))
        .add_header("cookie", reader_cookie.clone())
        .await;
    assert_eq!(subscribed.status_code().as_u16(), 201);
    let subscribed: Value = subscribed.json();
    assert_eq!(subscribed["username"], "writer");
    assert_eq!(subscribed["is_subscribed"], true);
    assert_eq!(subscribed["recipes_count"], 2);
    assert_eq!(subscribed["recipes"].as_array().unwrap().len(), 1);

    // Subscribing twice is a conflict
    let again = server
        .post(&format!("/api/v1/users/{}/subscribe", author.id))
        .add_header("cookie", reader_cookie.clone())
        .await;
    assert_eq!(again.status_code().as_u16(), 409);

    // The author shows up in the subscriptions listing
    let listing = server
        .get("/api/v1/users/subscriptions?recipes_limit=1")
        .add_header("cookie", reader_cookie.clone())
        .await;
    listing.assert_status_ok();
    let listing: Value = listing.json();
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["username"], "writer");
    assert_eq!(listing[0]["recipes"].as_array().unwrap().len(), 1);

    // The author's profile reads as subscribed for the reader, anonymous sees false
    let profile = server
        .get(&format!("/api/v1/users/{}", author.id))
        .add_header("cookie", reader_cookie.clone())
        .await;
    assert_eq!(profile.json::<Value>()["is_subscribed"], true);
    let anonymous_profile = server.get(&format!("/api/v1/users/{}", author.id)).await;
    assert_eq!(anonymous_profile.json::<Value>()["is_subscribed"], false);

    // Unsubscribe, then unsubscribing again is not found
    let removed = server
        .delete(&format!("/api/v1/users/{}/subscribe", author.id))
        .add_header("cookie", reader_cookie.clone())
        .await;
    assert_eq!(removed.status_code().as_u16(), 204);
    let again = server
        .delete(&format!("/api/v1/users/{}/subscribe", author.id))
        .add_header("cookie", reader_cookie)
        .await;
    assert_eq!(again.status_code().as_u16(), 404);
}

#[sqlx::test]
#[test_log::test]
async fn test_anonymous_recipe_read_has_false_flags(pool: PgPool) {
    let author = create_test_user(&pool, "flags@example.com", "flags").await;
    let tag = create_test_tag(&pool, "pie", "#221100", "pie").await;
    let flour = create_test_ingredient(&pool, "flour", "g").await;

    let server = create_test_app(pool.clone()).await;
    let cookie = session_cookie_for(&author);

    let created = server
        .post("/api/v1/recipes")
        .add_header("cookie", cookie.clone())
        .json(&json!({
            "name": "Apple pie", "text": "Bake.", "cooking_time": 45,
            "tags": [tag.id], "ingredients": [{ "id": flour.id, "amount": 400 }]
        }))
        .await;
    let recipe_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    // The author favorites and carts it, and the stored legacy columns get poisoned
    server
        .post(&format!("/api/v1/recipes/{recipe_id}/favorite"))
        .add_header("cookie", cookie.clone())
        .await
        .assert_status(axum::http::StatusCode::CREATED);
    sqlx::query("UPDATE recipes SET is_favorited = TRUE, is_in_shopping_cart = TRUE")
        .execute(&pool)
        .await
        .unwrap();

    // The authenticated viewer sees their own derived flags
    let seen = server
        .get(&format!("/api/v1/recipes/{recipe_id}"))
        .add_header("cookie", cookie)
        .await;
    let seen: Value = seen.json();
    assert_eq!(seen["is_favorited"], true);
    assert_eq!(seen["is_in_shopping_cart"], false);

    // Anonymous viewers see false regardless of stored column values
    let anonymous = server.get(&format!("/api/v1/recipes/{recipe_id}")).await;
    let anonymous: Value = anonymous.json();
    assert_eq!(anonymous["is_favorited"], false);
    assert_eq!(anonymous["is_in_shopping_cart"], false);
}

#[sqlx::test]
#[test_log::test]
async fn test_reference_data_endpoints(pool: PgPool) {
    let admin = create_test_admin_user(&pool, "curator@example.com", "curator").await;
    let user = create_test_user(&pool, "plain@example.com", "plain").await;

    let server = create_test_app(pool).await;
    let admin_cookie = session_cookie_for(&admin);
    let user_cookie = session_cookie_for(&user);

    // Only admins may create reference data
    let forbidden = server
        .post("/api/v1/tags")
        .add_header("cookie", user_cookie)
        .json(&json!({ "name": "vegan", "color": "#11AA22", "slug": "vegan" }))
        .await;
    assert_eq!(forbidden.status_code().as_u16(), 403);

    let created = server
        .post("/api/v1/tags")
        .add_header("cookie", admin_cookie.clone())
        .json(&json!({ "name": "vegan", "color": "#11AA22", "slug": "vegan" }))
        .await;
    assert_eq!(created.status_code().as_u16(), 201);

    // A malformed color is a validation failure
    let bad_color = server
        .post("/api/v1/tags")
        .add_header("cookie", admin_cookie.clone())
        .json(&json!({ "name": "neon", "color": "green", "slug": "neon" }))
        .await;
    assert_eq!(bad_color.status_code().as_u16(), 400);

    for name in ["flour", "flaxseed", "sugar"] {
        let response = server
            .post("/api/v1/ingredients")
            .add_header("cookie", admin_cookie.clone())
            .json(&json!({ "name": name, "measurement_unit": "g" }))
            .await;
        assert_eq!(response.status_code().as_u16(), 201);
    }

    // Public reads, with the name-prefix filter
    let tags = server.get("/api/v1/tags").await;
    tags.assert_status_ok();
    assert_eq!(tags.json::<Value>().as_array().unwrap().len(), 1);

    let filtered = server.get("/api/v1/ingredients?name=fl").await;
    filtered.assert_status_ok();
    assert_eq!(filtered.json::<Value>().as_array().unwrap().len(), 2);
}
