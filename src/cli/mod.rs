//! Interface de linha de comando do calcwire.

pub mod commands;
pub mod demo;
pub mod interactive;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// calcwire - calculadora remota com rastro de passos e intermediário com cache.
#[derive(Parser, Debug)]
#[command(name = "calcwire")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "calcwire.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inicia o avaliador.
    Serve {
        /// Host de escuta (padrão: `[server].host`).
        #[arg(long)]
        host: Option<String>,

        /// Porta de escuta (padrão: `[server].port`).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Inicia o intermediário com cache.
    Proxy {
        /// Host de escuta (padrão: `[proxy].host`).
        #[arg(long)]
        host: Option<String>,

        /// Porta de escuta (padrão: `[proxy].port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host do avaliador de origem.
        #[arg(long)]
        upstream_host: Option<String>,

        /// Porta do avaliador de origem.
        #[arg(long)]
        upstream_port: Option<u16>,
    },

    /// Envia expressões de demonstração a um avaliador ou intermediário.
    Client {
        /// Host de destino (padrão: `[client].host`).
        #[arg(long)]
        host: Option<String>,

        /// Porta de destino (padrão: `[client].port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Envia só esta expressão e sai (sem menu).
        #[arg(short, long)]
        expr: Option<String>,

        /// Não pede o rastro de passos.
        #[arg(long)]
        no_steps: bool,

        /// Não permite que a troca seja cacheada.
        #[arg(long)]
        no_cache: bool,

        /// Idade máxima aceita, em segundos (0 força recarga, 65535 = indefinido).
        #[arg(long)]
        cache_control: Option<u32>,
    },

    /// Avalia uma expressão de demonstração localmente.
    Eval {
        /// Nome da expressão (expr1 .. expr6).
        name: String,
    },

    /// Inicializa configuração no diretório atual.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Mostra versão.
    Version,
}
