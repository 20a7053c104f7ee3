#![allow(dead_code)] // Path stubs are only referenced by the utoipa macros.

use crate::{
    error::ErrorResponse,
    models::{
        parking_lot::{ParkingLotResponse, ParkingLotView},
        parking_session::{
            AckResponse, CurrentSessionResponse, ExtendSessionRequest, HistoryItem,
            HistoryResponse, NavigationResponse, NavigationStatus, NavigationView,
            ParkingLotInfo, SessionResponse, SessionStatus, SessionView, SpotType,
            StartSessionRequest,
        },
        user::{LoginRequest, LoginResponse, UserResponse, UserType},
        vehicle::{CreateVehicleRequest, VehicleListResponse, VehicleResponse, VehicleView},
        HistoryQuery, Position,
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        login_doc,
        me_doc,
        logout_doc,
        list_vehicles_doc,
        create_vehicle_doc,
        set_default_vehicle_doc,
        delete_vehicle_doc,
        parking_lot_doc,
        start_session_doc,
        current_session_doc,
        session_history_doc,
        navigation_doc,
        pay_doc,
        extend_doc
    ),
    components(
        schemas(
            // auth
            LoginRequest,
            LoginResponse,
            UserResponse,
            UserType,
            // vehicles and lots
            CreateVehicleRequest,
            VehicleView,
            VehicleResponse,
            VehicleListResponse,
            ParkingLotView,
            ParkingLotResponse,
            // parking sessions
            StartSessionRequest,
            ExtendSessionRequest,
            SessionView,
            SessionStatus,
            SpotType,
            ParkingLotInfo,
            NavigationView,
            NavigationStatus,
            Position,
            HistoryItem,
            HistoryQuery,
            CurrentSessionResponse,
            SessionResponse,
            HistoryResponse,
            NavigationResponse,
            AckResponse,
            ErrorResponse
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "登录与当前用户"),
        (name = "Vehicles", description = "车辆管理"),
        (name = "Parking lots", description = "停车场信息"),
        (name = "Parking", description = "停车会话：计费、导航、缴费")
    ),
    security(("BearerAuth" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_string());
        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = LoginResponse),
        (status = 401, description = "用户名或密码错误", body = ErrorResponse)
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, description = "当前用户", body = UserResponse)),
    tag = "Auth"
)]
fn me_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "已退出登录", body = AckResponse)),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/api/vehicles",
    responses((status = 200, description = "已登记的车辆，默认车辆在前", body = VehicleListResponse)),
    tag = "Vehicles"
)]
fn list_vehicles_doc() {}

#[utoipa::path(
    post,
    path = "/api/vehicles",
    request_body = CreateVehicleRequest,
    responses(
        (status = 201, description = "车辆已登记", body = VehicleResponse),
        (status = 400, description = "参数无效", body = ErrorResponse),
        (status = 409, description = "车牌号已存在", body = ErrorResponse)
    ),
    tag = "Vehicles"
)]
fn create_vehicle_doc() {}

#[utoipa::path(
    put,
    path = "/api/vehicles/{vehicle_id}/default",
    params(("vehicle_id" = String, Path, description = "车辆 ID (UUID)")),
    responses(
        (status = 200, description = "默认车辆已更新", body = AckResponse),
        (status = 404, description = "车辆不存在", body = ErrorResponse)
    ),
    tag = "Vehicles"
)]
fn set_default_vehicle_doc() {}

#[utoipa::path(
    delete,
    path = "/api/vehicles/{vehicle_id}",
    params(("vehicle_id" = String, Path, description = "车辆 ID (UUID)")),
    responses(
        (status = 200, description = "车辆已删除", body = AckResponse),
        (status = 404, description = "车辆不存在", body = ErrorResponse),
        (status = 409, description = "车辆正在停车中", body = ErrorResponse)
    ),
    tag = "Vehicles"
)]
fn delete_vehicle_doc() {}

#[utoipa::path(
    get,
    path = "/api/parking/lots/{lot_id}",
    params(("lot_id" = String, Path, description = "停车场 ID (UUID)")),
    responses(
        (status = 200, description = "停车场详情与计费规则", body = ParkingLotResponse),
        (status = 404, description = "停车场不存在", body = ErrorResponse)
    ),
    tag = "Parking lots",
    security(())
)]
fn parking_lot_doc() {}

#[utoipa::path(
    post,
    path = "/api/user/parking/session",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "会话已创建", body = SessionResponse),
        (status = 404, description = "车辆或停车场不存在", body = ErrorResponse),
        (status = 409, description = "已有进行中的会话", body = ErrorResponse)
    ),
    tag = "Parking"
)]
fn start_session_doc() {}

#[utoipa::path(
    get,
    path = "/api/user/parking/session/current",
    responses((status = 200, description = "当前会话（无则为 null）", body = CurrentSessionResponse)),
    tag = "Parking"
)]
fn current_session_doc() {}

#[utoipa::path(
    get,
    path = "/api/user/parking/session/history",
    params(HistoryQuery),
    responses((status = 200, description = "已结束的会话", body = HistoryResponse)),
    tag = "Parking"
)]
fn session_history_doc() {}

#[utoipa::path(
    get,
    path = "/api/user/parking/session/{session_id}/navigation",
    params(("session_id" = String, Path, description = "会话 ID (UUID)")),
    responses(
        (status = 200, description = "导航前进一步后的状态", body = NavigationResponse),
        (status = 404, description = "会话不存在", body = ErrorResponse)
    ),
    tag = "Parking"
)]
fn navigation_doc() {}

#[utoipa::path(
    post,
    path = "/api/user/parking/session/{session_id}/pay",
    params(("session_id" = String, Path, description = "会话 ID (UUID)")),
    responses(
        (status = 200, description = "缴费成功，会话结束", body = AckResponse),
        (status = 400, description = "会话已结束", body = ErrorResponse),
        (status = 404, description = "会话不存在", body = ErrorResponse)
    ),
    tag = "Parking"
)]
fn pay_doc() {}

#[utoipa::path(
    post,
    path = "/api/user/parking/session/{session_id}/extend",
    params(("session_id" = String, Path, description = "会话 ID (UUID)")),
    request_body = ExtendSessionRequest,
    responses(
        (status = 200, description = "已延长", body = AckResponse),
        (status = 400, description = "分钟数无效", body = ErrorResponse)
    ),
    tag = "Parking"
)]
fn extend_doc() {}
