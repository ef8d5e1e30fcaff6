use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer JWT issued by the login and register endpoints.
struct DashboardSecurityAddon;

impl Modify for DashboardSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token returned by `/api/auth/login` or `/api/auth/register`:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```\n\n\
                            Browsers can rely on the session cookie set by the same endpoints instead.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "SubBike API", description = "Metro passenger flow, shared-bike counts and bike scheduling plans"),
    modifiers(&DashboardSecurityAddon),
    paths(
        api::handlers::auth::send_code,
        api::handlers::auth::login,
        api::handlers::auth::register,
        api::handlers::auth::logout,
        api::handlers::admin::list_users,
        api::handlers::admin::update_user_role,
        api::handlers::admin::delete_user,
        api::handlers::users::create_user,
        api::handlers::users::edit_user,
        api::handlers::users::delete_user,
        api::handlers::profile::change_password,
        api::handlers::profile::change_email,
        api::handlers::subway::top_stations,
        api::handlers::subway::daily_totals,
        api::handlers::subway::weekly_flow,
        api::handlers::subway::station_map,
        api::handlers::subway::hourly_trend,
        api::handlers::bike::top_stations,
        api::handlers::bike::station_totals,
        api::handlers::bike::station_history,
        api::handlers::bike::requirement,
        api::handlers::scheduling_plans::list_all_plans,
        api::handlers::scheduling_plans::list_my_plans,
        api::handlers::scheduling_plans::create_plan,
        api::handlers::scheduling_plans::get_plan,
        api::handlers::scheduling_plans::update_plan,
        api::handlers::scheduling_plans::delete_plan,
        api::handlers::stations::list_stations,
    ),
    components(
        schemas(
            api::models::auth::SendCodeRequest,
            api::models::auth::LoginRequest,
            api::models::auth::RegisterRequest,
            api::models::auth::JwtResponse,
            api::models::auth::MessageResponse,
            api::models::users::Role,
            api::models::users::UserResponse,
            api::models::users::RoleUpdateRequest,
            api::models::users::UserDto,
            api::models::users::UserEditRequest,
            api::models::users::ChangePasswordRequest,
            api::models::users::ChangeEmailRequest,
            api::models::ridership::FlowMetric,
            api::models::ridership::DailyFlow,
            api::models::ridership::HourlyFlow,
            api::models::ridership::StationCount,
            api::models::ridership::DailyCount,
            api::models::ridership::ErrorResponse,
            api::models::scheduling_plans::PlanStatus,
            api::models::scheduling_plans::SchedulingPlanCreate,
            api::models::scheduling_plans::SchedulingPlanUpdate,
            api::models::scheduling_plans::SchedulingPlanResponse,
            api::models::stations::StationResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Login, registration and email verification codes"),
        (name = "admin", description = "User and role management for administrators"),
        (name = "users", description = "Legacy user maintenance endpoints"),
        (name = "profile", description = "Self-service account changes"),
        (name = "subway", description = "Metro passenger flow aggregates"),
        (name = "bike", description = "Shared-bike counts and demand estimates"),
        (name = "scheduling-plans", description = "Bike redistribution plans"),
        (name = "stations", description = "Station reference data"),
    )
)]
pub struct DashboardApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_dashboard_routes() {
        let spec = DashboardApiDoc::openapi();
        let paths = &spec.paths.paths;

        for path in [
            "/api/auth/login",
            "/api/admin/users/{id}/role",
            "/api/subway/weekly",
            "/api/bikeReq/amount",
            "/api/scheduling-plans/{id}",
            "/api/stations/all",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }

        let schemes = &spec.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("BearerAuth"));
    }
}
