use axum::{
    handler::Handler,
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{categories, products, users},
    middleware::{auth_gate, request_id, require_admin, require_self_or_admin},
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/users/signin", post(users::signin))
        .route("/users/signup", post(users::signup))
        .route("/users/forgot-password", post(users::forgot_password))
        .route("/users/verify-otp", post(users::verify_otp))
        .route("/users/reset-password", post(users::reset_password))
        .route("/users/changepassword", patch(users::change_password))
        .route(
            "/users/customers/all",
            get(users::list_customers.layer(from_fn(require_admin))),
        )
        .route(
            "/users/all/users",
            get(users::list_users.layer(from_fn(require_admin))),
        )
        .route("/users/byemail/{email}", get(users::get_user_by_email))
        .route(
            "/users/activate/{email}",
            patch(users::activate_user.layer(from_fn(require_admin))),
        )
        .route(
            "/users/role/{user_id}",
            patch(users::change_role.layer(from_fn(require_admin))),
        )
        // DELETE addresses the account by email through the same segment.
        .route(
            "/users/{user_id}",
            get(users::get_user)
                .put(users::update_profile.layer(from_fn(require_self_or_admin)))
                .delete(users::deactivate_user.layer(from_fn(require_admin))),
        );

    let catalogue_routes = Router::new()
        .route(
            "/api/categories",
            get(categories::list_categories)
                .post(categories::create_category.layer(from_fn(require_admin))),
        )
        .route(
            "/api/categories/{category_id}",
            get(categories::get_category)
                .put(categories::update_category.layer(from_fn(require_admin)))
                .delete(categories::delete_category.layer(from_fn(require_admin))),
        )
        .route(
            "/product",
            get(products::list_products)
                .post(products::create_product.layer(from_fn(require_admin))),
        )
        .route(
            "/product/{product_id}",
            get(products::get_product)
                .put(products::update_product.layer(from_fn(require_admin)))
                .delete(products::delete_product.layer(from_fn(require_admin))),
        )
        .route(
            "/product/category/{category_id}",
            get(products::list_products_by_category),
        );

    Router::new()
        .merge(user_routes)
        .merge(catalogue_routes)
        .layer(from_fn_with_state(state.clone(), auth_gate))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::PATCH,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state)
}
