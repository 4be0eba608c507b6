use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Erros de regra de negócio viram respostas 4xx; o resto vira 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Número de lote '{0}' já está em uso")]
    BatchNumberAlreadyExists(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado ou inativo")]
    UserInactive,

    #[error("Sem permissão para esta ação")]
    Forbidden,

    // Busca direta no catálogo (rota /products/{id})
    #[error("Produto não encontrado")]
    ProductNotFound,

    // Produto referenciado por uma compra que não existe ou está inativo.
    // É falha de regra de negócio: responde 400.
    #[error("Produto {0} não encontrado")]
    ProductUnavailable(i32),

    #[error("Estoque insuficiente para {name}. Disponível: {available}")]
    InsufficientStock { name: String, available: i32 },

    #[error("Imagem não encontrada")]
    ImageNotFound,

    #[error("Categoria não encontrada")]
    CategoryNotFound,

    // Categoria referenciada na criação/edição de produto ausente ou inativa
    #[error("Categoria não encontrada ou inativa")]
    CategoryInactive,

    #[error("Compra não encontrada")]
    PurchaseNotFound,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    // Status HTTP de cada variante. Separado do IntoResponse para podermos
    // testar o mapeamento sem montar uma Response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ProductUnavailable(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::CategoryInactive => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserInactive => StatusCode::UNAUTHORIZED,

            AppError::Forbidden => StatusCode::FORBIDDEN,

            AppError::ProductNotFound => StatusCode::NOT_FOUND,
            AppError::ImageNotFound => StatusCode::NOT_FOUND,
            AppError::CategoryNotFound => StatusCode::NOT_FOUND,
            AppError::PurchaseNotFound => StatusCode::NOT_FOUND,

            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::BatchNumberAlreadyExists(_) => StatusCode::CONFLICT,

            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Validação retorna todos os detalhes, campo a campo.
        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let status = self.status_code();

        // Erros inesperados são logados com o detalhe completo;
        // o cliente só recebe uma mensagem genérica.
        let error_message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
            "Ocorreu um erro inesperado.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_are_client_faults() {
        assert_eq!(
            AppError::ProductUnavailable(99).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InsufficientStock { name: "Café".into(), available: 2 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::CategoryInactive.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn lookup_errors_are_not_found() {
        assert_eq!(AppError::ProductNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::ImageNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::PurchaseNotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn persistence_errors_are_server_faults() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn insufficient_stock_message_names_product_and_quantity() {
        let err = AppError::InsufficientStock { name: "Café Torrado".into(), available: 2 };
        let msg = err.to_string();
        assert!(msg.contains("Café Torrado"));
        assert!(msg.contains('2'));
    }
}
